mod registry;
mod room;

pub use registry::{JoinEffects, LeaveEffects, RoomRegistry};
pub(crate) use room::Room;
