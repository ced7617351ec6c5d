mod backend;
mod engine;
mod error;
mod event;
mod rtc;
mod session;
mod state;

pub use backend::{BackendEvent, MediaBackend, MediaBackendFactory, SignalSink};
pub use engine::NegotiationEngine;
pub use error::NegotiationError;
pub use event::EngineEvent;
pub use rtc::{RtcBackend, RtcBackendFactory, RtcConfig};
pub use session::SessionHandle;
pub use state::NegotiationState;
