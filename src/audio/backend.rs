use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::CaptureError;

/// Receiver of encoded chunks, in capture order
///
/// The sender side is dropped only after the recorder has flushed its tail,
/// so a closed channel is the "recorder stopped" notification.
pub type ChunkReceiver = mpsc::Receiver<Vec<u8>>;

/// Capacity of the chunk channel between recorder and collector
pub const CHUNK_CHANNEL_CAPACITY: usize = 100;

/// Grants access to a microphone
///
/// Platform-specific implementations:
/// - File: replay a WAV file as if it were live input (testing/batch)
/// - cpal: default input device (feature `cpal`)
#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    /// Acquire a microphone stream
    ///
    /// Permission refusal and missing devices both surface as `PermissionDenied`.
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>, CaptureError>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// An acquired microphone plus its incremental recorder
#[async_trait::async_trait]
pub trait MicrophoneStream: Send + Sync {
    /// Start recording
    ///
    /// Returns a channel receiver that receives an encoded chunk every
    /// `chunk_interval`. Concatenated in order, the chunks form one
    /// decodable stream.
    async fn start(&mut self, chunk_interval: Duration) -> Result<ChunkReceiver, CaptureError>;

    /// Ask the recorder to finalize
    ///
    /// Any buffered audio is delivered as a last chunk, then the chunk
    /// channel closes. Tracks stay open until `release_tracks`.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Stop the underlying hardware tracks. Idempotent.
    fn release_tracks(&mut self);

    /// Check if the hardware tracks are still open
    fn tracks_live(&self) -> bool;

    /// Get stream name for logging
    fn name(&self) -> &str;
}

/// Microphone provider factory
pub struct MediaDevicesFactory;

impl MediaDevicesFactory {
    /// Create a provider for the configured audio source
    pub fn create(source: AudioSource) -> Result<Arc<dyn MediaDevices>> {
        match source {
            AudioSource::File(path) => Ok(Arc::new(super::file::FileMediaDevices::new(path))),

            AudioSource::Microphone => {
                #[cfg(feature = "cpal")]
                {
                    Ok(Arc::new(super::cpal_backend::CpalMediaDevices::new()))
                }

                #[cfg(not(feature = "cpal"))]
                {
                    anyhow::bail!("Live microphone capture requires the `cpal` feature")
                }
            }
        }
    }
}

/// Audio source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Default input device
    Microphone,
    /// WAV file replayed as live input
    File(PathBuf),
}
