// Scripted stand-ins for the microphone and decoder
//
// Lets the controller tests drive exact chunk sequences and observe whether
// the microphone tracks were released.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use voice_capture::audio::{ChunkReceiver, DecodedAudioBuffer};
use voice_capture::{AudioDecoder, CaptureError, MediaDevices, MicrophoneStream};

/// Shared view of what happened to the microphone
#[derive(Clone, Default)]
pub struct MicProbe {
    pub opened: Arc<AtomicUsize>,
    pub tracks_live: Arc<AtomicBool>,
    pub stop_requested: Arc<AtomicBool>,
}

impl MicProbe {
    pub fn tracks_live(&self) -> bool {
        self.tracks_live.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

/// How the scripted microphone behaves
#[derive(Clone, Default)]
pub struct Script {
    /// Refuse access outright
    pub deny: bool,
    /// Acquire the device, then fail to start recording
    pub fail_start: bool,
    /// Delivered as soon as recording starts
    pub chunks: Vec<Vec<u8>>,
    /// Delivered while finalizing, after stop is requested
    pub tail: Option<Vec<u8>>,
}

pub struct ScriptedDevices {
    script: Script,
    pub probe: MicProbe,
}

impl ScriptedDevices {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            probe: MicProbe::default(),
        }
    }

    pub fn with_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self::new(Script {
            chunks,
            ..Script::default()
        })
    }
}

#[async_trait::async_trait]
impl MediaDevices for ScriptedDevices {
    async fn open_microphone(&self) -> Result<Box<dyn MicrophoneStream>, CaptureError> {
        if self.script.deny {
            return Err(CaptureError::PermissionDenied("user dismissed the prompt".to_string()));
        }

        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        self.probe.tracks_live.store(true, Ordering::SeqCst);

        Ok(Box::new(ScriptedMicrophone {
            script: self.script.clone(),
            probe: self.probe.clone(),
            tx: None,
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedMicrophone {
    script: Script,
    probe: MicProbe,
    tx: Option<mpsc::Sender<Vec<u8>>>,
}

#[async_trait::async_trait]
impl MicrophoneStream for ScriptedMicrophone {
    async fn start(&mut self, _chunk_interval: Duration) -> Result<ChunkReceiver, CaptureError> {
        if self.script.fail_start {
            return Err(CaptureError::PermissionDenied("device busy".to_string()));
        }

        let (tx, rx) = mpsc::channel(100);
        for chunk in &self.script.chunks {
            tx.send(chunk.clone()).await.expect("receiver alive");
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.probe.stop_requested.store(true, Ordering::SeqCst);
        if let Some(tx) = self.tx.take() {
            if let Some(tail) = self.script.tail.clone() {
                let _ = tx.send(tail).await;
            }
        }
        Ok(())
    }

    fn release_tracks(&mut self) {
        self.tx = None;
        self.probe.tracks_live.store(false, Ordering::SeqCst);
    }

    fn tracks_live(&self) -> bool {
        self.probe.tracks_live()
    }

    fn name(&self) -> &str {
        "scripted microphone"
    }
}

/// Decoder that records its input and returns a canned result
pub struct RecordingDecoder {
    pub inputs: Arc<Mutex<Vec<Vec<u8>>>>,
    outcome: Result<(usize, u32), String>,
}

impl RecordingDecoder {
    /// Decodes anything into `samples` zero samples at `sample_rate`
    pub fn silence(samples: usize, sample_rate: u32) -> Self {
        Self {
            inputs: Arc::new(Mutex::new(Vec::new())),
            outcome: Ok((samples, sample_rate)),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            inputs: Arc::new(Mutex::new(Vec::new())),
            outcome: Err(reason.to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl AudioDecoder for RecordingDecoder {
    async fn decode(&self, encoded: Vec<u8>) -> Result<DecodedAudioBuffer, CaptureError> {
        self.inputs.lock().unwrap().push(encoded);
        match &self.outcome {
            Ok((samples, rate)) => DecodedAudioBuffer::new(vec![0.0; *samples], *rate),
            Err(reason) => Err(CaptureError::DecodeFailure(reason.clone())),
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Decoder that holds each decode until `open` is called
pub struct GatedDecoder {
    pub inner: RecordingDecoder,
    gate: Arc<tokio::sync::Notify>,
}

impl GatedDecoder {
    pub fn silence(samples: usize, sample_rate: u32) -> Self {
        Self {
            inner: RecordingDecoder::silence(samples, sample_rate),
            gate: Arc::new(tokio::sync::Notify::new()),
        }
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait::async_trait]
impl AudioDecoder for GatedDecoder {
    async fn decode(&self, encoded: Vec<u8>) -> Result<DecodedAudioBuffer, CaptureError> {
        self.gate.notified().await;
        self.inner.decode(encoded).await
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Poll until `check` holds, for up to a second
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
