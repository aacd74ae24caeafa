pub mod backend;
pub mod decode;
pub mod file;
pub mod wav;

#[cfg(feature = "cpal")]
pub mod cpal_backend;

pub use backend::{AudioSource, ChunkReceiver, MediaDevices, MediaDevicesFactory, MicrophoneStream};
pub use decode::{AudioDecoder, DecodedAudioBuffer, SymphoniaDecoder};
pub use file::{AudioFile, FileMediaDevices, FileMicrophone};
pub use wav::{encode_buffer, encode_wav, WavContainer};

#[cfg(feature = "cpal")]
pub use cpal_backend::CpalMediaDevices;
