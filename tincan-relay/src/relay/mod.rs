mod router;
mod service;

pub use router::RelayRouter;
pub use service::SignalingService;
