pub mod model;

pub use model::{
    IceCandidateInit, Participant, ParticipantId, Role, RoomId, SdpKind, SessionDescription,
    SignalMessage,
};
