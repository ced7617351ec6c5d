mod ws_handler;

pub use ws_handler::{AppState, ws_handler};
