//! Recording session management
//!
//! This module provides the capture side of the voice pipeline:
//! - `CaptureController`: microphone lifecycle, start/stop, finalize
//! - `RecordingSession`: the ordered chunk sequence of one recording
//! - Session statistics and state

mod config;
mod controller;
mod session;
mod stats;

pub use config::CaptureConfig;
pub use controller::CaptureController;
pub use session::RecordingSession;
pub use stats::{CaptureState, SessionStats};
