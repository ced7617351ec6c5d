use crate::error::NegotiationError;
use crate::state::NegotiationState;
use std::sync::Arc;
use tincan_core::{ParticipantId, Role};
use webrtc::track::track_remote::TrackRemote;

/// What the engine surfaces to the UI layer.
pub enum EngineEvent {
    /// The relay assigned (or re-assigned, after a peer left) our role.
    RoleAssigned(Role),
    /// A remote peer became addressable; calling it is the UI's decision.
    PeerJoined {
        remote: ParticipantId,
        name: String,
    },
    StateChanged {
        remote: ParticipantId,
        state: NegotiationState,
    },
    RemoteTrack {
        remote: ParticipantId,
        track: Arc<TrackRemote>,
    },
    /// One non-blocking notification per failure; the session is already
    /// closed when this fires.
    NegotiationFailed {
        remote: ParticipantId,
        error: NegotiationError,
    },
    CallEnded {
        remote: ParticipantId,
    },
}
