use thiserror::Error;
use tincan_core::ParticipantId;

/// A join that cannot be admitted. Rejected joins leave registry state
/// untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("join rejected: missing display name or room id")]
    MalformedJoin,

    /// This design is two-party; a third joiner is refused outright rather
    /// than silently left unaddressable.
    #[error("room '{0}' already has two participants")]
    RoomFull(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("no live connection for participant {0}")]
    NoRoute(ParticipantId),
}
