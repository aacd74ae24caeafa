use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// No recording
    Idle,
    /// Recorder running, chunks arriving
    Recording,
    /// Stop requested; waiting for the tail chunks, then decoding
    Finalizing,
}

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: Uuid,

    pub state: CaptureState,

    /// When the recording started
    pub started_at: DateTime<Utc>,

    /// Time since start, in seconds
    pub duration_secs: f64,

    /// Number of encoded chunks received so far
    pub chunks_count: usize,

    /// Total encoded bytes received so far
    pub bytes_captured: usize,
}
