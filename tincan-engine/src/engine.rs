use crate::backend::{MediaBackendFactory, SignalSink};
use crate::event::EngineEvent;
use crate::session::{self, SessionCommand, SessionHandle, SessionParams};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tincan_core::{ParticipantId, Role, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::track::track_local::TrackLocal;

const BACKEND_EVENT_QUEUE_DEPTH: usize = 256;

/// One endpoint's negotiation engine.
///
/// Owns a session per remote participant and is the single entry point for
/// inbound signaling: every message is dispatched by type to the session it
/// belongs to. The UI layer drives calls and receives [`EngineEvent`]s; the
/// engine reaches the relay only through its [`SignalSink`].
pub struct NegotiationEngine {
    local_name: String,
    role: Mutex<Option<Role>>,
    sessions: DashMap<ParticipantId, SessionHandle>,
    backends: Arc<dyn MediaBackendFactory>,
    sink: Arc<dyn SignalSink>,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl NegotiationEngine {
    pub fn new(
        local_name: impl Into<String>,
        backends: Arc<dyn MediaBackendFactory>,
        sink: Arc<dyn SignalSink>,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let engine = Self {
            local_name: local_name.into(),
            role: Mutex::new(None),
            sessions: DashMap::new(),
            backends,
            sink,
            events,
        };
        (engine, events_rx)
    }

    pub fn local_role(&self) -> Option<Role> {
        *self.role.lock().unwrap()
    }

    /// Dispatches one inbound signaling message.
    pub async fn handle_signal(&self, msg: SignalMessage) {
        match msg {
            SignalMessage::ShowCallButton => self.assign_role(Role::Initiator),
            SignalMessage::ShowAnswerButton => self.assign_role(Role::Responder),

            SignalMessage::UserJoined { user_id, name } => {
                // the peer is addressable now; calling it stays a UI decision
                if self
                    .ensure_session(user_id.clone(), name.clone(), Role::Initiator)
                    .await
                    .is_some()
                {
                    let _ = self.events.send(EngineEvent::PeerJoined {
                        remote: user_id,
                        name,
                    });
                }
            }

            SignalMessage::Offer {
                offer, from, name, ..
            } => {
                let Some(from) = from else {
                    warn!("offer without a sender id dropped");
                    return;
                };
                let Some(handle) = self.ensure_session(from.clone(), name, Role::Responder).await
                else {
                    return;
                };
                handle.send(SessionCommand::RemoteOffer { offer, from }).await;
            }

            SignalMessage::Answer { answer, from, .. } => {
                let Some(from) = from else {
                    warn!("answer without a sender id dropped");
                    return;
                };
                let Some(handle) = self.session(&from) else {
                    debug!(remote = %from, "answer for unknown session dropped");
                    return;
                };
                handle.send(SessionCommand::RemoteAnswer { answer }).await;
            }

            SignalMessage::IceCandidate {
                candidate, from, ..
            } => {
                let Some(from) = from else {
                    warn!("candidate without a sender id dropped");
                    return;
                };
                let Some(handle) = self.session(&from) else {
                    // the remote peer may have already hung up
                    debug!(remote = %from, "candidate for unknown session dropped");
                    return;
                };
                handle
                    .send(SessionCommand::RemoteCandidate { candidate })
                    .await;
            }

            SignalMessage::EndCall { name, .. } => self.handle_remote_end(&name).await,

            SignalMessage::Join { .. } => {
                debug!("endpoint-to-relay message echoed back, ignored")
            }
        }
    }

    /// Starts the offer/answer exchange toward an addressable peer. Returns
    /// false when the peer is unknown or an exchange is already in flight.
    pub fn call(&self, remote: &ParticipantId) -> bool {
        let Some(handle) = self.session(remote) else {
            warn!(%remote, "call to a peer with no session");
            return false;
        };
        handle.try_negotiate()
    }

    /// Attaches a local track to the peer's session. On a connected session
    /// this raises the renegotiation trigger.
    pub async fn add_track(&self, remote: &ParticipantId, track: Arc<dyn TrackLocal + Send + Sync>) {
        let Some(handle) = self.session(remote) else {
            warn!(%remote, "add_track for a peer with no session");
            return;
        };
        handle.send(SessionCommand::AddTrack(track)).await;
    }

    /// Hangs up on one peer, notifying it so its own session closes too.
    pub async fn end_call(&self, remote: &ParticipantId) {
        let Some((_, handle)) = self.sessions.remove(remote) else {
            return;
        };
        handle.end(true).await;
    }

    /// Tears down every session, as when leaving the room.
    pub async fn leave(&self) {
        let handles: Vec<SessionHandle> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.sessions.clear();
        for handle in handles {
            handle.end(true).await;
        }
    }

    fn assign_role(&self, role: Role) {
        info!(?role, "role assigned");
        *self.role.lock().unwrap() = Some(role);
        let _ = self.events.send(EngineEvent::RoleAssigned(role));
    }

    /// Live session for a peer. A session that closed itself is purged here,
    /// so a later call toward the same peer starts fresh from `Idle`.
    fn session(&self, remote: &ParticipantId) -> Option<SessionHandle> {
        let handle = self.sessions.get(remote)?.value().clone();
        if handle.is_closed() {
            self.sessions.remove(remote);
            return None;
        }
        Some(handle)
    }

    /// Gets or creates the session for a remote peer. `fallback_role` is used
    /// until the relay has told us our role: a peer we saw join makes us the
    /// Initiator, a peer whose offer reached us makes us a Responder.
    async fn ensure_session(
        &self,
        remote: ParticipantId,
        remote_name: String,
        fallback_role: Role,
    ) -> Option<SessionHandle> {
        if let Some(handle) = self.session(&remote) {
            return Some(handle);
        }

        let (backend_tx, backend_rx) = mpsc::channel(BACKEND_EVENT_QUEUE_DEPTH);
        let backend = match self.backends.create(backend_tx).await {
            Ok(backend) => backend,
            Err(e) => {
                warn!(%remote, "failed to create media backend: {e}");
                return None;
            }
        };

        // a concurrent dispatch may have beaten us here
        if let Some(handle) = self.session(&remote) {
            let _ = backend.close().await;
            return Some(handle);
        }

        let handle = session::spawn(
            SessionParams {
                remote_id: remote.clone(),
                remote_name,
                local_name: self.local_name.clone(),
                local_role: self.local_role().unwrap_or(fallback_role),
                backend,
                sink: self.sink.clone(),
                events: self.events.clone(),
            },
            backend_rx,
        );
        self.sessions.insert(remote, handle.clone());
        Some(handle)
    }

    /// The contract carries no sender id on `EndCall`, so the session is
    /// picked by the remote display name; with none matching, every session
    /// goes (rooms are two-party, there is at most one).
    async fn handle_remote_end(&self, name: &str) {
        let mut targets: Vec<ParticipantId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().remote_name == name)
            .map(|entry| entry.key().clone())
            .collect();
        if targets.is_empty() {
            targets = self
                .sessions
                .iter()
                .map(|entry| entry.key().clone())
                .collect();
        }

        for remote in targets {
            if let Some((_, handle)) = self.sessions.remove(&remote) {
                info!(%remote, "remote peer ended the call");
                handle.end(false).await;
            }
        }
    }
}
