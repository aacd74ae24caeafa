//! HTTP API for driving voice capture
//!
//! This module provides a REST API around the capture controller:
//! - POST /voice/record/start - Acquire the microphone and start recording
//! - POST /voice/record/stop - Stop and download the recording as `voice.wav`
//! - GET /voice/record/status - Query controller state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
