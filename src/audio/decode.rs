use anyhow::{anyhow, Context, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use super::wav::{STREAMING_SIZE_PLACEHOLDER, WAV_HEADER_LEN};
use crate::error::CaptureError;

/// One channel of float samples at a known rate
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, CaptureError> {
        if sample_rate == 0 {
            return Err(CaptureError::DecodeFailure(
                "decoded stream reports a sample rate of 0".to_string(),
            ));
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Turns the concatenated chunk stream of a session into raw samples
#[async_trait::async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Decode an encoded buffer; any failure is a `DecodeFailure`
    async fn decode(&self, encoded: Vec<u8>) -> Result<DecodedAudioBuffer, CaptureError>;

    /// Get decoder name for logging
    fn name(&self) -> &str;
}

/// Decoder backed by symphonia's format probe and codec registry
#[derive(Debug, Default, Clone)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl AudioDecoder for SymphoniaDecoder {
    async fn decode(&self, encoded: Vec<u8>) -> Result<DecodedAudioBuffer, CaptureError> {
        let (samples, sample_rate) = tokio::task::spawn_blocking(move || decode_first_channel(encoded))
            .await
            .map_err(|e| CaptureError::DecodeFailure(format!("decoder task failed: {}", e)))?
            .map_err(|e| CaptureError::DecodeFailure(format!("{:#}", e)))?;

        DecodedAudioBuffer::new(samples, sample_rate)
    }

    fn name(&self) -> &str {
        "symphonia"
    }
}

/// Decode the first audio track, keeping channel 0 only
fn decode_first_channel(mut encoded: Vec<u8>) -> Result<(Vec<f32>, u32)> {
    repair_streaming_wav_header(&mut encoded);

    let encoded_len = encoded.len();
    let mss = MediaSourceStream::new(Box::new(Cursor::new(encoded)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unrecognized audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("No audio track in captured stream"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .context("Unsupported codec")?;

    let mut sample_rate = codec_params.sample_rate;
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("Failed to read packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(e).context("Failed to decode packet"),
        };

        let spec = *decoded.spec();
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
        }
        let channels = spec.channels.count().max(1);

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend(buf.samples().iter().step_by(channels).copied());
    }

    let sample_rate = sample_rate.ok_or_else(|| anyhow!("Captured stream has no sample rate"))?;

    info!(
        "Decoded {} bytes into {} samples at {}Hz",
        encoded_len,
        samples.len(),
        sample_rate
    );

    Ok((samples, sample_rate))
}

/// Fix RIFF/data size fields so they agree with the buffer length
///
/// Streaming writers emit placeholder sizes because the length is unknown
/// when the header goes out. Buffers that aren't RIFF/WAVE are left alone.
/// Returns true when the header was patched.
pub fn repair_streaming_wav_header(buf: &mut [u8]) -> bool {
    if buf.len() < WAV_HEADER_LEN || &buf[0..4] != b"RIFF" || &buf[8..12] != b"WAVE" {
        return false;
    }

    let Some(data_offset) = find_data_chunk(buf) else {
        return false;
    };

    let mut patched = false;

    let expected_riff = clamp_u32(buf.len() - 8);
    let current_riff = read_u32(buf, 4);
    if current_riff != expected_riff {
        debug!("RIFF size {} does not match buffer, patching to {}", current_riff, expected_riff);
        buf[4..8].copy_from_slice(&expected_riff.to_le_bytes());
        patched = true;
    }

    let available = clamp_u32(buf.len() - data_offset);
    let current_data = read_u32(buf, data_offset - 4);
    let placeholder = current_data == STREAMING_SIZE_PLACEHOLDER || current_data == 0;
    if current_data != available && (placeholder || current_data > available) {
        warn!(
            "Streaming WAV data size {} patched to {} bytes",
            current_data, available
        );
        buf[data_offset - 4..data_offset].copy_from_slice(&available.to_le_bytes());
        patched = true;
    }

    patched
}

/// Offset of the first byte of PCM data, if a data chunk header is present
fn find_data_chunk(buf: &[u8]) -> Option<usize> {
    let mut pos = 12;
    while pos + 8 <= buf.len() {
        let len = read_u32(buf, pos + 4) as usize;
        if &buf[pos..pos + 4] == b"data" {
            return Some(pos + 8);
        }
        // Chunks are word aligned
        pos = pos.checked_add(8)?.checked_add(len)?.checked_add(len & 1)?;
    }
    None
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn clamp_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
