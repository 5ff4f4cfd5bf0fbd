//! HTTP API for the browser client
//!
//! The client polls state and drives the interview through:
//! - POST /api/start - Start a new interview
//! - GET /api/state - Snapshot of the current interview
//! - POST /api/record - Start recording an answer
//! - POST /api/stop_recording - Ask the running recording to finish
//! - POST /api/reset_recording - Clear a wedged recording/processing state
//! - GET /api/voice_status - Backends in use
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::ActionResponse;
pub use routes::create_router;
pub use state::AppState;
