use thiserror::Error;

/// Errors surfaced by the capture pipeline
///
/// `PermissionDenied`, `EmptyCapture` and `DecodeFailure` are the three
/// user-visible terminal states of a recording; each one asks the user for a
/// different fix, so they are never folded into each other.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Microphone access refused, or no usable input device
    #[error("Microphone unavailable: {0}")]
    PermissionDenied(String),

    /// Stop was requested but no audio bytes were collected
    #[error("No audio captured")]
    EmptyCapture,

    /// The collected chunk stream could not be decoded into samples
    #[error("Could not decode audio: {0}")]
    DecodeFailure(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    /// A chunk arrived after the session was sealed by the stop event
    #[error("Recording session is sealed")]
    SessionSealed,

    #[error("Failed to encode WAV: {0}")]
    Encode(#[from] EncodeError),

    /// The chunk collector died before the recorder reported it had stopped
    #[error("Recording interrupted: {0}")]
    Interrupted(String),
}

impl CaptureError {
    /// Stable machine-readable name, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied(_) => "permission_denied",
            CaptureError::EmptyCapture => "empty_capture",
            CaptureError::DecodeFailure(_) => "decode_failure",
            CaptureError::AlreadyRecording => "already_recording",
            CaptureError::NotRecording => "not_recording",
            CaptureError::SessionSealed => "session_sealed",
            CaptureError::Encode(_) => "encode_failure",
            CaptureError::Interrupted(_) => "interrupted",
        }
    }

    /// What the user can do about it
    pub fn remediation(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied(_) => {
                "Grant microphone access or connect an input device, then start again"
            }
            CaptureError::EmptyCapture => {
                "Check that the microphone is working and speak louder, then record again"
            }
            CaptureError::DecodeFailure(_) => "Retry the recording",
            CaptureError::AlreadyRecording => "Stop the current recording first",
            CaptureError::NotRecording => "Start a recording first",
            CaptureError::SessionSealed | CaptureError::Encode(_) | CaptureError::Interrupted(_) => {
                "Start a new recording"
            }
        }
    }
}

/// Errors from the PCM to WAV encoder
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// Zero, or too high for the 32-bit byte-rate field
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// The data size field would not fit the 32-bit RIFF header
    #[error("{samples} samples do not fit in a RIFF container")]
    TooLarge { samples: usize },
}
