use crate::registry::RoomRegistry;
use crate::relay::RelayRouter;
use axum::extract::ws::Message;
use std::sync::Arc;
use tincan_core::{ParticipantId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Per-connection dispatcher tying the registry and the router together.
///
/// `Join` is the only inbound message that mutates state; everything else the
/// relay understands is forwarded point-to-point without interpretation. A
/// transport-level disconnect is treated as an implicit leave.
#[derive(Clone)]
pub struct SignalingService {
    registry: Arc<RoomRegistry>,
    router: RelayRouter,
}

impl SignalingService {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
            router: RelayRouter::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn router(&self) -> &RelayRouter {
        &self.router
    }

    /// Attaches a freshly connected endpoint's outbound channel.
    pub fn connect(&self, id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.router.register(id, tx);
    }

    pub fn handle_message(&self, sender: &ParticipantId, msg: SignalMessage) {
        match msg {
            SignalMessage::Join { name, room_id } => self.handle_join(sender, &name, room_id),
            msg @ (SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::IceCandidate { .. }
            | SignalMessage::EndCall { .. }) => {
                if let Err(e) = self.router.forward(sender, msg) {
                    warn!(%sender, "signal dropped: {e}");
                }
            }
            other => {
                warn!(%sender, "relay-to-endpoint notice from a client dropped: {other:?}");
            }
        }
    }

    fn handle_join(&self, sender: &ParticipantId, name: &str, room_id: RoomId) {
        match self.registry.join(sender.clone(), name, room_id) {
            Ok(Some(effects)) => {
                let _ = self.router.send(sender, &effects.joiner_notice);
                if let Some((peer, notice)) = effects.peer_notice {
                    let _ = self.router.send(&peer, &notice);
                }
            }
            Ok(None) => debug!(%sender, "duplicate join ignored"),
            Err(e) => {
                // rejected with no state change
                warn!(%sender, "join rejected: {e}");
            }
        }
    }

    /// Implicit leave: drops the live connection and runs the membership
    /// transition. A promoted survivor is told the call is over and that it
    /// may call again.
    pub fn handle_disconnect(&self, id: &ParticipantId) {
        self.router.unregister(id);
        let Some(effects) = self.registry.leave(id) else {
            return;
        };
        info!(%id, room = %effects.left.room_id, "connection closed, left room");

        if let Some(survivor) = effects.promoted {
            let _ = self.router.send(
                &survivor,
                &SignalMessage::EndCall {
                    name: effects.left.name.clone(),
                    to: survivor.clone(),
                },
            );
            let _ = self.router.send(&survivor, &SignalMessage::ShowCallButton);
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}
