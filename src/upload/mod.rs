//! Hand-off to the transcription collaborator
//!
//! The network call is made elsewhere; this module only fixes what the
//! artifact looks like on the wire and how the reply is read.

pub mod messages;

pub use messages::{TranscriptionError, TranscriptionReply};

use crate::audio::WavContainer;

/// Filename the WAV is uploaded under
pub const UPLOAD_FILE_NAME: &str = "voice.wav";
/// MIME type of the upload
pub const UPLOAD_MIME_TYPE: &str = "audio/x-wav";
/// Multipart form field carrying the file
pub const UPLOAD_FIELD_NAME: &str = "audio";

/// A finished recording packaged as a file-like upload
#[derive(Debug, Clone)]
pub struct VoiceUpload {
    wav: WavContainer,
}

impl VoiceUpload {
    pub fn new(wav: WavContainer) -> Self {
        Self { wav }
    }

    pub fn file_name(&self) -> &'static str {
        UPLOAD_FILE_NAME
    }

    pub fn mime_type(&self) -> &'static str {
        UPLOAD_MIME_TYPE
    }

    pub fn field_name(&self) -> &'static str {
        UPLOAD_FIELD_NAME
    }

    /// `Content-Disposition` value for serving or posting the file
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", UPLOAD_FILE_NAME)
    }

    pub fn wav(&self) -> &WavContainer {
        &self.wav
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.wav.into_bytes()
    }
}
