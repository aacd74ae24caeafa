use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::CaptureConfig;
use super::session::RecordingSession;
use super::stats::{CaptureState, SessionStats};
use crate::audio::{encode_buffer, AudioDecoder, ChunkReceiver, MediaDevices, MicrophoneStream, SymphoniaDecoder, WavContainer};
use crate::error::CaptureError;

/// Owns the microphone and the one active recording session
///
/// Start acquires a microphone and begins chunked recording. Stop waits for
/// the recorder's tail, releases the microphone, then decodes the collected
/// stream and encodes it as WAV. The microphone is released on every exit
/// path of stop, whether or not decoding succeeds, and even when the caller
/// abandons the stop midway.
pub struct CaptureController {
    devices: Arc<dyn MediaDevices>,
    decoder: Arc<dyn AudioDecoder>,
    config: CaptureConfig,
    state: watch::Sender<CaptureState>,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    stream: Box<dyn MicrophoneStream>,
    session: Arc<Mutex<RecordingSession>>,
    collector: JoinHandle<()>,
}

impl CaptureController {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        decoder: Arc<dyn AudioDecoder>,
        config: CaptureConfig,
    ) -> Self {
        info!(
            "Capture controller initialized (devices: {}, decoder: {}, chunks every {:?})",
            devices.name(),
            decoder.name(),
            config.chunk_interval
        );

        Self {
            devices,
            decoder,
            config,
            state: watch::Sender::new(CaptureState::Idle),
            active: None,
        }
    }

    /// Controller with the symphonia decoder
    pub fn with_devices(devices: Arc<dyn MediaDevices>, config: CaptureConfig) -> Self {
        Self::new(devices, Arc::new(SymphoniaDecoder::new()), config)
    }

    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    /// Follow state changes without holding the controller
    pub fn subscribe_state(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    /// Live statistics for the active session, if any
    pub async fn stats(&self) -> Option<SessionStats> {
        match &self.active {
            Some(active) => Some(active.session.lock().await.stats()),
            None => None,
        }
    }

    /// Acquire the microphone and start a recording session
    ///
    /// Rejected while a session is active; the running session is not touched.
    pub async fn start_recording(&mut self) -> Result<Uuid, CaptureError> {
        if self.state() != CaptureState::Idle {
            warn!("Recording already started");
            return Err(CaptureError::AlreadyRecording);
        }

        info!("Requesting microphone from {}", self.devices.name());

        let mut stream = self.devices.open_microphone().await.map_err(|e| {
            warn!("Microphone request failed: {}", e);
            e
        })?;

        let chunk_rx = match stream.start(self.config.chunk_interval).await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Recorder failed to start on {}: {}", stream.name(), e);
                stream.release_tracks();
                return Err(e);
            }
        };

        let session = RecordingSession::new();
        let session_id = session.id();
        let session = Arc::new(Mutex::new(session));

        let collector = tokio::spawn(collect_chunks(Arc::clone(&session), chunk_rx));

        info!("Recording session {} started on {}", session_id, stream.name());

        self.active = Some(ActiveCapture {
            stream,
            session,
            collector,
        });
        self.state.send_replace(CaptureState::Recording);

        Ok(session_id)
    }

    /// Stop the active session and produce its WAV
    pub async fn stop_recording(&mut self) -> Result<WavContainer, CaptureError> {
        let Some(active) = self.active.take() else {
            warn!("Recording not active");
            return Err(CaptureError::NotRecording);
        };

        self.state.send_replace(CaptureState::Finalizing);
        let _idle = IdleOnDrop(&self.state);

        // Runs to completion even if this future is dropped, so the
        // microphone is still released
        let result = tokio::spawn(finish(active, Arc::clone(&self.decoder)))
            .await
            .unwrap_or_else(|e| Err(CaptureError::Interrupted(format!("finalize task failed: {}", e))));

        match &result {
            Ok(wav) => info!(
                "WAV ready: {} samples at {}Hz ({} bytes)",
                wav.sample_count(),
                wav.sample_rate(),
                wav.len()
            ),
            Err(e) => warn!("Recording ended without audio: {}", e),
        }

        result
    }
}

/// Puts the controller back to Idle however stop ends
struct IdleOnDrop<'a>(&'a watch::Sender<CaptureState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(CaptureState::Idle);
    }
}

/// Stop the recorder, release the microphone, then decode and encode
async fn finish(
    active: ActiveCapture,
    decoder: Arc<dyn AudioDecoder>,
) -> Result<WavContainer, CaptureError> {
    let ActiveCapture {
        mut stream,
        session,
        collector,
    } = active;

    info!("Stopping recorder on {}", stream.name());

    // The recorder closes the chunk channel once its tail is delivered;
    // the collector seals the session when it sees that.
    if let Err(e) = stream.stop().await {
        error!("Recorder failed to stop cleanly: {}", e);
        collector.abort();
        stream.release_tracks();
        return Err(e);
    }

    let collected = collector.await;
    stream.release_tracks();
    info!("Microphone released: {}", stream.name());

    collected.map_err(|e| CaptureError::Interrupted(format!("chunk collector failed: {}", e)))?;

    let session = Arc::try_unwrap(session)
        .map_err(|_| CaptureError::Interrupted("recording session still shared".to_string()))?
        .into_inner();

    let encoded = session.finalize()?;
    let decoded = decoder.decode(encoded).await?;

    debug!(
        "Decoded {} samples at {}Hz ({:.2}s)",
        decoded.sample_count(),
        decoded.sample_rate(),
        decoded.duration_seconds()
    );

    Ok(encode_buffer(&decoded)?)
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if let Some(mut active) = self.active.take() {
            warn!("Capture controller dropped while recording, releasing microphone");
            active.collector.abort();
            active.stream.release_tracks();
        }
    }
}

/// Append chunks in arrival order until the recorder closes the channel
async fn collect_chunks(session: Arc<Mutex<RecordingSession>>, mut chunk_rx: ChunkReceiver) {
    while let Some(chunk) = chunk_rx.recv().await {
        let len = chunk.len();
        let mut session = session.lock().await;

        if let Err(e) = session.append_chunk(chunk) {
            warn!("Dropping chunk of {} bytes: {}", len, e);
            break;
        }

        debug!(
            "Chunk received: {} bytes ({} total)",
            len,
            session.bytes_captured()
        );
    }

    session.lock().await.seal();
}
