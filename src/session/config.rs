use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the capture controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// How often the recorder emits a chunk while recording
    /// Short enough that an interrupted session still leaves most of its audio
    /// Default: 50ms
    pub chunk_interval: Duration,
}

impl CaptureConfig {
    pub fn with_chunk_interval_ms(chunk_interval_ms: u64) -> Self {
        Self {
            chunk_interval: Duration::from_millis(chunk_interval_ms),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            chunk_interval: Duration::from_millis(50),
        }
    }
}
