use crate::error::RoutingError;
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::sync::Arc;
use tincan_core::{ParticipantId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Store-nothing point-to-point dispatcher.
///
/// Holds one outbound channel per live connection. `Offer`, `Answer`,
/// `IceCandidate` and `EndCall` are forwarded to the participant named by
/// their `to` field with `from` rewritten to the sender's true connection id;
/// the SDP/ICE payloads are never decoded here.
#[derive(Clone)]
pub struct RelayRouter {
    connections: Arc<DashMap<ParticipantId, mpsc::UnboundedSender<Message>>>,
}

impl RelayRouter {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
        }
    }

    pub fn register(&self, id: ParticipantId, tx: mpsc::UnboundedSender<Message>) {
        self.connections.insert(id, tx);
    }

    pub fn unregister(&self, id: &ParticipantId) {
        self.connections.remove(id);
    }

    pub fn is_connected(&self, id: &ParticipantId) -> bool {
        self.connections.contains_key(id)
    }

    /// Serializes and delivers a message to one live connection.
    pub fn send(&self, to: &ParticipantId, msg: &SignalMessage) -> Result<(), RoutingError> {
        let Some(conn) = self.connections.get(to) else {
            return Err(RoutingError::NoRoute(to.clone()));
        };
        match serde_json::to_string(msg) {
            Ok(json) => {
                if conn.send(Message::Text(json.into())).is_err() {
                    // channel closed under us: the socket task is gone
                    return Err(RoutingError::NoRoute(to.clone()));
                }
                Ok(())
            }
            Err(e) => {
                error!("failed to serialize signal message: {e}");
                Ok(())
            }
        }
    }

    /// Forwards a point-to-point message on behalf of `sender`, stamping the
    /// sender's real id into `from`.
    pub fn forward(
        &self,
        sender: &ParticipantId,
        msg: SignalMessage,
    ) -> Result<(), RoutingError> {
        let stamped = match msg {
            SignalMessage::Offer {
                offer, to, name, ..
            } => SignalMessage::Offer {
                offer,
                to,
                from: Some(sender.clone()),
                name,
            },
            SignalMessage::Answer { answer, to, .. } => SignalMessage::Answer {
                answer,
                to,
                from: Some(sender.clone()),
            },
            SignalMessage::IceCandidate { candidate, to, .. } => SignalMessage::IceCandidate {
                candidate,
                to,
                from: Some(sender.clone()),
            },
            msg @ SignalMessage::EndCall { .. } => msg,
            other => {
                debug!(%sender, "message is not point-to-point, not forwarded: {other:?}");
                return Ok(());
            }
        };
        let to = match &stamped {
            SignalMessage::Offer { to, .. }
            | SignalMessage::Answer { to, .. }
            | SignalMessage::IceCandidate { to, .. }
            | SignalMessage::EndCall { to, .. } => to.clone(),
            _ => unreachable!("stamped message is always addressed"),
        };
        self.send(&to, &stamped)
    }
}

impl Default for RelayRouter {
    fn default() -> Self {
        Self::new()
    }
}
