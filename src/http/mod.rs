//! HTTP API for a presentation layer to drive capture and read results
//!
//! - POST /capture/start - Start recording
//! - POST /capture/stop - Stop recording early
//! - GET /capture/status - Recording state, elapsed time, visualizer frame
//! - GET /pipeline/state - Current pipeline state
//! - POST /pipeline/reset - Back to idle
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
