use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::stats::{CaptureState, SessionStats};
use crate::error::CaptureError;

/// The chunks of one recording, in arrival order
///
/// Mutated only by chunk arrival (`append_chunk`) and the stop event
/// (`seal`). `finalize` consumes the session, so a session can be turned into
/// an encoded buffer at most once.
#[derive(Debug)]
pub struct RecordingSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: CaptureState,
    chunks: Vec<Vec<u8>>,
    bytes: usize,
}

impl RecordingSession {
    /// Begin a new session in the `Recording` state
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        debug!("Recording session {} created", id);

        Self {
            id,
            started_at: Utc::now(),
            state: CaptureState::Recording,
            chunks: Vec::new(),
            bytes: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    pub fn bytes_captured(&self) -> usize {
        self.bytes
    }

    /// Record a chunk delivered by the recorder
    ///
    /// Empty chunks carry nothing and are skipped.
    pub fn append_chunk(&mut self, chunk: Vec<u8>) -> Result<(), CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::SessionSealed);
        }

        if chunk.is_empty() {
            return Ok(());
        }

        self.bytes += chunk.len();
        self.chunks.push(chunk);
        Ok(())
    }

    /// The recorder has stopped; no further chunks are accepted
    pub fn seal(&mut self) {
        if self.state == CaptureState::Recording {
            debug!(
                "Recording session {} sealed: {} chunks, {} bytes",
                self.id,
                self.chunks.len(),
                self.bytes
            );
            self.state = CaptureState::Finalizing;
        }
    }

    /// Concatenate the chunks into one encoded buffer
    ///
    /// Seals the session first if the stop event was not observed.
    pub fn finalize(mut self) -> Result<Vec<u8>, CaptureError> {
        self.seal();

        if self.bytes == 0 {
            info!("Recording session {} captured no audio", self.id);
            return Err(CaptureError::EmptyCapture);
        }

        let encoded = self.chunks.concat();
        info!(
            "Recording session {} finalized: {} chunks, {} bytes",
            self.id,
            self.chunks.len(),
            encoded.len()
        );

        Ok(encoded)
    }

    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            session_id: self.id,
            state: self.state,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            chunks_count: self.chunks.len(),
            bytes_captured: self.bytes,
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}
