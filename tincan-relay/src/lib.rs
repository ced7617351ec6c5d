mod error;
mod registry;
mod relay;
mod server;

pub use error::{RegistryError, RoutingError};
pub use registry::{JoinEffects, LeaveEffects, RoomRegistry};
pub use relay::{RelayRouter, SignalingService};
pub use server::{AppState, ws_handler};
