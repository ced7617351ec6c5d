mod participant;
mod room;
mod signaling;

pub use participant::{Participant, ParticipantId, Role};
pub use room::RoomId;
pub use signaling::{IceCandidateInit, SdpKind, SessionDescription, SignalMessage};
