use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::AudioSource;
use crate::session::CaptureConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureSettings,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Microphone,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSettings {
    pub source: SourceKind,
    /// WAV replayed when `source = "file"`
    pub input_path: String,
    pub chunk_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub recordings_path: String,
}

impl Config {
    /// Load from `path` (any format the config crate knows, extension optional)
    ///
    /// Missing files and keys fall back to built-in defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "voice-capture")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8787)?
            .set_default("capture.source", "file")?
            .set_default("capture.input_path", "tests/fixtures/voice.wav")?
            .set_default("capture.chunk_interval_ms", 50)?
            .set_default("output.recordings_path", "recordings")?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl CaptureSettings {
    pub fn audio_source(&self) -> AudioSource {
        match self.source {
            SourceKind::File => AudioSource::File(PathBuf::from(&self.input_path)),
            SourceKind::Microphone => AudioSource::Microphone,
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig::with_chunk_interval_ms(self.chunk_interval_ms)
    }
}
