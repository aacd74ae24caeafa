pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod upload;

pub use audio::{
    encode_wav, AudioDecoder, AudioFile, AudioSource, DecodedAudioBuffer, FileMediaDevices,
    MediaDevices, MediaDevicesFactory, MicrophoneStream, SymphoniaDecoder, WavContainer,
};
pub use config::Config;
pub use error::{CaptureError, EncodeError};
pub use http::{create_router, AppState};
pub use session::{CaptureConfig, CaptureController, CaptureState, RecordingSession, SessionStats};
pub use upload::{TranscriptionError, TranscriptionReply, VoiceUpload};
