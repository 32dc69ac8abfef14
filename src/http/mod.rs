//! Local HTTP API for the quiz UI
//!
//! - GET /health - Health check
//! - GET /status - Detection and recognition status
//! - POST /recognition/start - Resume voice input
//! - POST /recognition/stop - Pause voice input (e.g. while showing feedback)

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
