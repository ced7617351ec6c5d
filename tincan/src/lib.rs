pub use tincan_core::{ParticipantId, RoomId};

pub mod model {
    pub use tincan_core::model::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use tincan_relay::*;
}

#[cfg(feature = "engine")]
pub mod engine {
    pub use tincan_engine::*;
}
