use crate::backend::{BackendEvent, MediaBackend, SignalSink};
use crate::error::NegotiationError;
use crate::event::EngineEvent;
use crate::state::NegotiationState;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tincan_core::{IceCandidateInit, ParticipantId, Role, SessionDescription};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::track::track_local::TrackLocal;

const COMMAND_QUEUE_DEPTH: usize = 100;

pub(crate) enum SessionCommand {
    /// Start (or restart, on a connected session) an offer/answer round.
    Negotiate,
    AddTrack(Arc<dyn TrackLocal + Send + Sync>),
    RemoteOffer { offer: Value, from: ParticipantId },
    RemoteAnswer { answer: Value },
    RemoteCandidate { candidate: Value },
    End { notify_peer: bool },
}

/// Control handle for one per-peer session actor.
///
/// The actor itself serializes all state transitions; the handle carries the
/// two flags that must act outside the queue: the glare guard, checked and
/// set before a negotiate command is even enqueued, and the closed flag,
/// set synchronously on end so in-flight async results get discarded.
#[derive(Clone)]
pub struct SessionHandle {
    pub remote_id: ParticipantId,
    pub remote_name: String,
    cmd_tx: mpsc::Sender<SessionCommand>,
    negotiating: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Raises the renegotiation trigger. Returns false when an exchange is
    /// already in flight: the trigger is dropped, not queued, because the
    /// exchange under way will carry its effect.
    pub fn try_negotiate(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        if self.negotiating.swap(true, Ordering::SeqCst) {
            debug!(remote = %self.remote_id, "negotiation already in flight, trigger dropped");
            return false;
        }
        if self.cmd_tx.try_send(SessionCommand::Negotiate).is_err() {
            self.negotiating.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) async fn send(&self, cmd: SessionCommand) {
        if self.closed.load(Ordering::SeqCst) {
            debug!(remote = %self.remote_id, "session closed, command dropped");
            return;
        }
        let _ = self.cmd_tx.send(cmd).await;
    }

    /// Tears the session down. Effective immediately: anything still awaited
    /// inside the actor completes but its result is discarded.
    pub(crate) async fn end(&self, notify_peer: bool) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.cmd_tx.send(SessionCommand::End { notify_peer }).await;
    }
}

pub(crate) struct SessionParams {
    pub remote_id: ParticipantId,
    pub remote_name: String,
    pub local_name: String,
    pub local_role: Role,
    pub backend: Arc<dyn MediaBackend>,
    pub sink: Arc<dyn SignalSink>,
    pub events: mpsc::UnboundedSender<EngineEvent>,
}

pub(crate) fn spawn(
    params: SessionParams,
    backend_rx: mpsc::Receiver<BackendEvent>,
) -> SessionHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let negotiating = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));

    let handle = SessionHandle {
        remote_id: params.remote_id.clone(),
        remote_name: params.remote_name.clone(),
        cmd_tx,
        negotiating: negotiating.clone(),
        closed: closed.clone(),
    };

    let session = NegotiationSession {
        remote_id: params.remote_id,
        local_name: params.local_name,
        local_role: params.local_role,
        state: NegotiationState::Idle,
        backend: params.backend,
        sink: params.sink,
        events: params.events,
        pending_candidates: VecDeque::new(),
        remote_description_set: false,
        negotiating,
        closed,
        cmd_rx,
        backend_rx,
    };
    tokio::spawn(session.run());

    handle
}

/// The per-peer state machine. One instance per remote participant, one
/// task per instance: commands and backend events are drained from a single
/// loop, so description operations never interleave within a session.
struct NegotiationSession {
    remote_id: ParticipantId,
    local_name: String,
    local_role: Role,
    state: NegotiationState,
    backend: Arc<dyn MediaBackend>,
    sink: Arc<dyn SignalSink>,
    events: mpsc::UnboundedSender<EngineEvent>,
    /// Candidates that arrived before the remote description was applied,
    /// in arrival order.
    pending_candidates: VecDeque<IceCandidateInit>,
    remote_description_set: bool,
    negotiating: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    backend_rx: mpsc::Receiver<BackendEvent>,
}

impl NegotiationSession {
    async fn run(mut self) {
        debug!(remote = %self.remote_id, "negotiation session started");

        let mut backend_open = true;
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => break,
                    }
                }
                evt = self.backend_rx.recv(), if backend_open => {
                    match evt {
                        Some(e) => self.handle_backend_event(e).await,
                        None => backend_open = false,
                    }
                }
            }

            if self.state == NegotiationState::Closed {
                break;
            }
        }

        debug!(remote = %self.remote_id, "negotiation session finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Negotiate => self.start_offer().await,
            SessionCommand::AddTrack(track) => self.attach_track(track).await,
            SessionCommand::RemoteOffer { offer, from } => self.accept_offer(offer, from).await,
            SessionCommand::RemoteAnswer { answer } => self.accept_answer(answer).await,
            SessionCommand::RemoteCandidate { candidate } => {
                self.accept_candidate(candidate).await
            }
            SessionCommand::End { notify_peer } => self.shutdown(notify_peer).await,
        }
    }

    async fn handle_backend_event(&mut self, evt: BackendEvent) {
        match evt {
            BackendEvent::LocalCandidate(candidate) => {
                self.sink.send_ice(self.remote_id.clone(), candidate).await;
            }
            BackendEvent::RemoteTrack(track) => {
                let _ = self.events.send(EngineEvent::RemoteTrack {
                    remote: self.remote_id.clone(),
                    track,
                });
            }
            BackendEvent::Disconnected => {
                info!(remote = %self.remote_id, "media path lost");
                self.shutdown(false).await;
            }
        }
    }

    /// Caller path. The glare guard was checked-and-set before this command
    /// was enqueued, so at most one offer round is in flight.
    async fn start_offer(&mut self) {
        let offer = match self.backend.create_offer().await {
            Ok(offer) => offer,
            Err(e) => return self.fail(NegotiationError::Backend(e)).await,
        };
        if self.discarded() {
            return;
        }
        self.set_state(NegotiationState::OfferCreated);

        if let Err(e) = self.backend.set_local_description(offer.clone()).await {
            return self.fail(NegotiationError::Backend(e)).await;
        }
        if self.discarded() {
            return;
        }

        self.sink
            .send_offer(self.remote_id.clone(), offer, self.local_name.clone())
            .await;
        self.set_state(NegotiationState::OfferSent);
    }

    async fn attach_track(&mut self, track: Arc<dyn TrackLocal + Send + Sync>) {
        if let Err(e) = self.backend.add_track(track).await {
            return self.fail(NegotiationError::Backend(e)).await;
        }
        if self.discarded() {
            return;
        }

        // A new track on an established session needs a fresh offer/answer
        // round; before the first exchange it simply rides the initial offer.
        if self.state == NegotiationState::Connected
            && !self.negotiating.swap(true, Ordering::SeqCst)
        {
            self.start_offer().await;
        }
    }

    /// Callee path, and the glare arbitration point: the Responder yields its
    /// own outstanding offer to an Initiator's, the Initiator drops the
    /// incoming one and lets the remote side yield.
    async fn accept_offer(&mut self, offer: Value, from: ParticipantId) {
        let desc: SessionDescription = match serde_json::from_value(offer) {
            Ok(desc) => desc,
            Err(e) => return self.fail(NegotiationError::Decode(e)).await,
        };

        if self.state.local_offer_outstanding() {
            match self.local_role {
                Role::Initiator => {
                    debug!(remote = %self.remote_id, "incoming offer lost arbitration, dropped");
                    return;
                }
                Role::Responder => {
                    info!(remote = %self.remote_id, "yielding local offer to incoming offer");
                    // applying the remote offer rolls our unanswered one back
                    self.negotiating.store(false, Ordering::SeqCst);
                }
            }
        }

        if let Err(e) = self.backend.set_remote_description(desc).await {
            return self.fail(NegotiationError::Backend(e)).await;
        }
        if self.discarded() {
            return;
        }
        self.remote_description_set = true;
        self.set_state(NegotiationState::OfferReceived);

        self.flush_candidates().await;
        if self.state == NegotiationState::Closed {
            return;
        }

        let answer = match self.backend.create_answer().await {
            Ok(answer) => answer,
            Err(e) => return self.fail(NegotiationError::Backend(e)).await,
        };
        if self.discarded() {
            return;
        }
        self.set_state(NegotiationState::AnswerCreated);

        if let Err(e) = self.backend.set_local_description(answer.clone()).await {
            return self.fail(NegotiationError::Backend(e)).await;
        }
        if self.discarded() {
            return;
        }

        // addressed to the offer's sender
        self.sink.send_answer(from, answer).await;
        self.set_state(NegotiationState::Connected);
    }

    async fn accept_answer(&mut self, answer: Value) {
        if self.state != NegotiationState::OfferSent {
            return self.fail(NegotiationError::AnswerWithoutOffer).await;
        }

        let desc: SessionDescription = match serde_json::from_value(answer) {
            Ok(desc) => desc,
            Err(e) => return self.fail(NegotiationError::Decode(e)).await,
        };
        if let Err(e) = self.backend.set_remote_description(desc).await {
            return self.fail(NegotiationError::Backend(e)).await;
        }
        if self.discarded() {
            return;
        }
        self.remote_description_set = true;

        self.flush_candidates().await;
        if self.state == NegotiationState::Closed {
            return;
        }

        self.negotiating.store(false, Ordering::SeqCst);
        self.set_state(NegotiationState::Connected);
    }

    /// A candidate may legitimately arrive before the remote description;
    /// it is held until the description applies, then flushed in order.
    async fn accept_candidate(&mut self, candidate: Value) {
        let init: IceCandidateInit = match serde_json::from_value(candidate) {
            Ok(init) => init,
            Err(e) => return self.fail(NegotiationError::Decode(e)).await,
        };

        if !self.remote_description_set {
            debug!(remote = %self.remote_id, "remote description not set yet, candidate held");
            self.pending_candidates.push_back(init);
            return;
        }
        if let Err(e) = self.backend.add_ice_candidate(init).await {
            self.fail(NegotiationError::Backend(e)).await;
        }
    }

    async fn flush_candidates(&mut self) {
        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(e) = self.backend.add_ice_candidate(candidate).await {
                return self.fail(NegotiationError::Backend(e)).await;
            }
            if self.discarded() {
                return;
            }
        }
    }

    async fn shutdown(&mut self, notify_peer: bool) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.closed.store(true, Ordering::SeqCst);

        if let Err(e) = self.backend.close().await {
            warn!(remote = %self.remote_id, "backend close failed: {e}");
        }
        if notify_peer {
            self.sink
                .send_end_call(self.remote_id.clone(), self.local_name.clone())
                .await;
        }

        self.set_state(NegotiationState::Closed);
        let _ = self.events.send(EngineEvent::CallEnded {
            remote: self.remote_id.clone(),
        });
    }

    /// Terminal failure: close, surface one notification, never retry.
    async fn fail(&mut self, error: NegotiationError) {
        warn!(remote = %self.remote_id, %error, "negotiation failed, closing session");

        self.closed.store(true, Ordering::SeqCst);
        self.negotiating.store(false, Ordering::SeqCst);
        let _ = self.backend.close().await;

        let _ = self.events.send(EngineEvent::NegotiationFailed {
            remote: self.remote_id.clone(),
            error,
        });
        self.set_state(NegotiationState::Closed);
    }

    /// True when the session was ended while an async operation was in
    /// flight; the operation's result must be thrown away.
    fn discarded(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) && self.state != NegotiationState::Closed {
            debug!(remote = %self.remote_id, "session ended mid-operation, result discarded");
            return true;
        }
        false
    }

    fn set_state(&mut self, state: NegotiationState) {
        if self.state == state {
            return;
        }
        debug!(remote = %self.remote_id, ?state, "session state");
        self.state = state;
        let _ = self.events.send(EngineEvent::StateChanged {
            remote: self.remote_id.clone(),
            state,
        });
    }
}
