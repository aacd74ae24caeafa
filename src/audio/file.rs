use anyhow::{Context, Result};
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{ChunkReceiver, MediaDevices, MicrophoneStream, CHUNK_CHANNEL_CAPACITY};
use crate::error::CaptureError;

/// A WAV file loaded for replay
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// The file as stored, header included
    pub bytes: Vec<u8>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        let duration_seconds = reader.duration() as f64 / spec.sample_rate as f64;

        let bytes = std::fs::read(path)
            .context("Failed to read audio file")?;

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} bytes",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            bytes.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            bytes,
        })
    }

    /// Bytes of audio per second of playback
    pub fn byte_rate(&self) -> usize {
        self.sample_rate as usize * self.channels as usize * (self.bits_per_sample as usize / 8).max(1)
    }
}

/// Media devices that hand out a WAV file as the "microphone"
pub struct FileMediaDevices {
    path: PathBuf,
}

impl FileMediaDevices {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl MediaDevices for FileMediaDevices {
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>, CaptureError> {
        let path = self.path.clone();
        let file = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .map_err(|e| CaptureError::PermissionDenied(format!("input file task failed: {}", e)))?
            .map_err(|e| CaptureError::PermissionDenied(format!("{:#}", e)))?;

        Ok(Box::new(FileMicrophone::new(file)))
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Replays a WAV file's bytes as encoded chunks, paced at the chunk interval
///
/// On stop, whatever has not been replayed yet is flushed as the tail chunk.
pub struct FileMicrophone {
    file: Arc<AudioFile>,
    stop_tx: Option<oneshot::Sender<()>>,
    replay_task: Option<JoinHandle<()>>,
    live: bool,
}

impl FileMicrophone {
    pub fn new(file: AudioFile) -> Self {
        Self {
            file: Arc::new(file),
            stop_tx: None,
            replay_task: None,
            live: true,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneStream for FileMicrophone {
    async fn start(&mut self, chunk_interval: Duration) -> Result<ChunkReceiver, CaptureError> {
        if !self.live {
            return Err(CaptureError::PermissionDenied(
                "microphone tracks already released".to_string(),
            ));
        }
        if self.replay_task.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let chunk_len = ((self.file.byte_rate() as u128 * chunk_interval.as_millis()) / 1000).max(1) as usize;

        info!(
            "Replaying {} in {} byte chunks every {:?}",
            self.file.path, chunk_len, chunk_interval
        );

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let file = Arc::clone(&self.file);

        let replay_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(chunk_interval.max(Duration::from_millis(1)));
            let mut offset = 0;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick(), if offset < file.bytes.len() => {
                        let end = (offset + chunk_len).min(file.bytes.len());
                        debug!("Replay chunk {}..{}", offset, end);
                        if tx.send(file.bytes[offset..end].to_vec()).await.is_err() {
                            warn!("Chunk receiver dropped, ending replay");
                            return;
                        }
                        offset = end;
                    }
                }
            }

            // Flush the tail before the channel closes
            if offset < file.bytes.len() {
                let _ = tx.send(file.bytes[offset..].to_vec()).await;
            }
        });

        self.stop_tx = Some(stop_tx);
        self.replay_task = Some(replay_task);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The replay task may already be gone if its receiver was dropped
            let _ = stop_tx.send(());
        }

        if let Some(task) = self.replay_task.take() {
            task.await
                .map_err(|e| CaptureError::Interrupted(format!("replay task failed: {}", e)))?;
        }

        Ok(())
    }

    fn release_tracks(&mut self) {
        if self.live {
            debug!("Releasing file microphone: {}", self.file.path);
        }
        if let Some(task) = self.replay_task.take() {
            task.abort();
        }
        self.stop_tx = None;
        self.live = false;
    }

    fn tracks_live(&self) -> bool {
        self.live
    }

    fn name(&self) -> &str {
        "file replay"
    }
}
