use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reply from the transcription endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptionReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Failures reported by (or while reaching) the transcription collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranscriptionError {
    /// The upload itself failed (network, HTTP status, unreadable body)
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The service answered with an error
    #[error("Transcription failed: {message}")]
    Service {
        message: String,
        details: Option<String>,
    },
}

impl TranscriptionReply {
    pub fn from_json(body: &[u8]) -> Result<Self, TranscriptionError> {
        serde_json::from_slice(body)
            .map_err(|e| TranscriptionError::Upload(format!("unreadable reply: {}", e)))
    }

    /// Text on success, the reported error otherwise
    ///
    /// An explicit `error` wins over any transcription in the same reply; a
    /// reply with neither is treated as a service error.
    pub fn into_result(self) -> Result<String, TranscriptionError> {
        match (self.error, self.transcription) {
            (Some(message), _) => Err(TranscriptionError::Service {
                message,
                details: self.details,
            }),
            (None, Some(text)) => Ok(text),
            (None, None) => Err(TranscriptionError::Service {
                message: "reply contained no transcription".to_string(),
                details: self.details,
            }),
        }
    }
}
