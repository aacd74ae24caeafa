// Live microphone capture through cpal
//
// cpal streams are not Send, so each stream lives on its own capture thread
// and is dropped there when the tracks are released. The thread pushes
// channel 0 as 16-bit PCM into a shared buffer; an async task drains it into
// chunks framed as a streaming WAV (placeholder sizes, patched on decode).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread::JoinHandle as ThreadHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::{ChunkReceiver, MediaDevices, MicrophoneStream, CHUNK_CHANNEL_CAPACITY};
use super::wav::streaming_header;
use crate::error::CaptureError;

/// Default system input device
#[derive(Debug, Default)]
pub struct CpalMediaDevices;

impl CpalMediaDevices {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MediaDevices for CpalMediaDevices {
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>, CaptureError> {
        let (device_name, sample_rate) = tokio::task::spawn_blocking(probe_default_input)
            .await
            .map_err(|e| CaptureError::PermissionDenied(format!("device probe failed: {}", e)))??;

        info!("Using audio input device: {} ({}Hz)", device_name, sample_rate);

        Ok(Box::new(CpalMicrophone {
            device_name,
            sample_rate,
            capturing: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            shutdown_tx: None,
            chunk_task: None,
            stop_tx: None,
            live: true,
        }))
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

fn probe_default_input() -> Result<(String, u32), CaptureError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| CaptureError::PermissionDenied("No audio input device found".to_string()))?;

    let config = device
        .default_input_config()
        .map_err(|e| CaptureError::PermissionDenied(format!("Input device unusable: {}", e)))?;

    let name = device.name().unwrap_or_else(|_| "unknown".to_string());
    Ok((name, config.sample_rate().0))
}

/// An open default input device
pub struct CpalMicrophone {
    device_name: String,
    sample_rate: u32,
    capturing: Arc<AtomicBool>,
    capture_thread: Option<ThreadHandle<()>>,
    shutdown_tx: Option<std_mpsc::Sender<()>>,
    chunk_task: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
    live: bool,
}

#[async_trait::async_trait]
impl MicrophoneStream for CpalMicrophone {
    async fn start(&mut self, chunk_interval: Duration) -> Result<ChunkReceiver, CaptureError> {
        if !self.live {
            return Err(CaptureError::PermissionDenied(
                "microphone tracks already released".to_string(),
            ));
        }
        if self.capture_thread.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let pcm = Arc::new(Mutex::new(Vec::<i16>::new()));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        self.capturing.store(true, Ordering::SeqCst);
        let capturing = Arc::clone(&self.capturing);
        let thread_pcm = Arc::clone(&pcm);

        let capture_thread = std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || run_capture_thread(thread_pcm, capturing, ready_tx, shutdown_rx))
            .map_err(|e| CaptureError::PermissionDenied(format!("capture thread: {}", e)))?;

        self.capture_thread = Some(capture_thread);
        self.shutdown_tx = Some(shutdown_tx);

        let sample_rate = match ready_rx.await {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                self.release_tracks();
                return Err(e);
            }
            Err(_) => {
                self.release_tracks();
                return Err(CaptureError::PermissionDenied(
                    "capture thread exited before the stream started".to_string(),
                ));
            }
        };

        let header = streaming_header(sample_rate)?;
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let chunk_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(chunk_interval.max(Duration::from_millis(1)));
            let mut header = Some(header);

            loop {
                let stopping = tokio::select! {
                    _ = &mut stop_rx => true,
                    _ = ticker.tick() => false,
                };

                let samples: Vec<i16> = match pcm.lock() {
                    Ok(mut buf) => std::mem::take(&mut *buf),
                    Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
                };

                if !samples.is_empty() {
                    let mut chunk = Vec::with_capacity(samples.len() * 2 + 44);
                    if let Some(header) = header.take() {
                        chunk.extend_from_slice(&header);
                    }
                    chunk.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
                    debug!("Microphone chunk: {} bytes", chunk.len());

                    if tx.send(chunk).await.is_err() {
                        warn!("Chunk receiver dropped, ending capture");
                        return;
                    }
                }

                if stopping {
                    break;
                }
            }
        });

        self.chunk_task = Some(chunk_task);
        self.stop_tx = Some(stop_tx);

        info!("Recording from {} every {:?}", self.device_name, chunk_interval);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        let result = match self.chunk_task.take() {
            Some(task) => task
                .await
                .map_err(|e| CaptureError::Interrupted(format!("chunk task failed: {}", e))),
            None => Ok(()),
        };

        self.capturing.store(false, Ordering::SeqCst);
        result
    }

    fn release_tracks(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(task) = self.chunk_task.take() {
            task.abort();
        }
        self.stop_tx = None;

        // Dropping the sender wakes the capture thread, which drops the stream
        self.shutdown_tx = None;
        if let Some(thread) = self.capture_thread.take() {
            // Never join on an async worker; the thread exits on its own
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(move || join_capture_thread(thread));
                }
                Err(_) => join_capture_thread(thread),
            }
        }

        if self.live {
            info!("Released microphone: {}", self.device_name);
        }
        self.live = false;
    }

    fn tracks_live(&self) -> bool {
        self.live
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        if self.live {
            self.release_tracks();
        }
    }
}

fn join_capture_thread(thread: ThreadHandle<()>) {
    if thread.join().is_err() {
        error!("Capture thread panicked");
    }
}

fn run_capture_thread(
    pcm: Arc<Mutex<Vec<i16>>>,
    capturing: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<Result<u32, CaptureError>>,
    shutdown_rx: std_mpsc::Receiver<()>,
) {
    let stream = match build_stream(pcm, capturing) {
        Ok((stream, sample_rate)) => {
            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(CaptureError::PermissionDenied(format!(
                    "Failed to start stream: {}",
                    e
                ))));
                return;
            }
            let _ = ready_tx.send(Ok(sample_rate));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    // Blocks until a shutdown message or the sender is dropped
    let _ = shutdown_rx.recv();
    drop(stream);
    debug!("Capture thread finished");
}

fn build_stream(
    pcm: Arc<Mutex<Vec<i16>>>,
    capturing: Arc<AtomicBool>,
) -> Result<(Stream, u32), CaptureError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| CaptureError::PermissionDenied("No audio input device found".to_string()))?;

    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::PermissionDenied(format!("Input device unusable: {}", e)))?;

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let sample_rate = config.sample_rate.0;

    let stream = match sample_format {
        SampleFormat::I16 => build_stream_typed::<i16>(&device, &config, pcm, capturing),
        SampleFormat::U16 => build_stream_typed::<u16>(&device, &config, pcm, capturing),
        SampleFormat::F32 => build_stream_typed::<f32>(&device, &config, pcm, capturing),
        other => Err(CaptureError::PermissionDenied(format!(
            "Unsupported sample format: {:?}",
            other
        ))),
    }?;

    Ok((stream, sample_rate))
}

fn build_stream_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    pcm: Arc<Mutex<Vec<i16>>>,
    capturing: Arc<AtomicBool>,
) -> Result<Stream, CaptureError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !capturing.load(Ordering::SeqCst) {
                    return;
                }

                if let Ok(mut buf) = pcm.lock() {
                    // Channel 0 only
                    buf.extend(data.iter().step_by(channels).map(|&s| to_pcm16(s.to_sample::<f32>())));
                }
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| CaptureError::PermissionDenied(format!("Failed to create audio stream: {}", e)))
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
