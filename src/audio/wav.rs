// PCM to WAV encoding
//
// Produces the canonical 44-byte-header, 16-bit mono PCM WAV container the
// transcription endpoint accepts. Every field is written explicitly so the
// output is byte-for-byte reproducible.

use crate::error::EncodeError;

use super::decode::DecodedAudioBuffer;

/// Size of the fixed RIFF + fmt + data header
pub const WAV_HEADER_LEN: usize = 44;

/// Gain applied before quantization to keep upstream-boosted input off the rails
pub const ATTENUATION: f32 = 0.8;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u32 = (BITS_PER_SAMPLE / 8) as u32;
const CHANNELS: u16 = 1;
const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// RIFF size field is the data length plus this offset
const RIFF_SIZE_OFFSET: u32 = 32;

/// Size placeholder used by streaming writers that don't know the final length
pub const STREAMING_SIZE_PLACEHOLDER: u32 = u32::MAX;

/// An encoded WAV file, ready to hand to the upload collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    bytes: Vec<u8>,
    sample_rate: u32,
    sample_count: usize,
}

impl WavContainer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn duration_seconds(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }
}

/// Encode a decoded buffer (see [`encode_wav`])
pub fn encode_buffer(buffer: &DecodedAudioBuffer) -> Result<WavContainer, EncodeError> {
    encode_wav(buffer.samples(), buffer.sample_rate())
}

/// Encode mono float samples in [-1, 1] as a 16-bit PCM WAV
///
/// Output is exactly `44 + 2 * samples.len()` bytes. Out-of-range input is
/// clamped, never wrapped. An empty slice still yields a valid header.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<WavContainer, EncodeError> {
    let byte_rate = sample_rate
        .checked_mul(BYTES_PER_SAMPLE)
        .filter(|_| sample_rate > 0)
        .ok_or(EncodeError::InvalidSampleRate(sample_rate))?;

    let data_len = u32::try_from(samples.len())
        .ok()
        .and_then(|n| n.checked_mul(BYTES_PER_SAMPLE))
        .filter(|len| len.checked_add(RIFF_SIZE_OFFSET).is_some())
        .ok_or(EncodeError::TooLarge {
            samples: samples.len(),
        })?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
    write_header(&mut bytes, sample_rate, byte_rate, data_len + RIFF_SIZE_OFFSET, data_len);

    for &sample in samples {
        bytes.extend_from_slice(&quantize(sample).to_le_bytes());
    }

    Ok(WavContainer {
        bytes,
        sample_rate,
        sample_count: samples.len(),
    })
}

/// Header for a WAV stream whose length is not known yet
///
/// Both size fields hold [`STREAMING_SIZE_PLACEHOLDER`]; the decoder patches
/// them to the real lengths once the stream is complete.
pub fn streaming_header(sample_rate: u32) -> Result<[u8; WAV_HEADER_LEN], EncodeError> {
    let byte_rate = sample_rate
        .checked_mul(BYTES_PER_SAMPLE)
        .filter(|_| sample_rate > 0)
        .ok_or(EncodeError::InvalidSampleRate(sample_rate))?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN);
    write_header(
        &mut bytes,
        sample_rate,
        byte_rate,
        STREAMING_SIZE_PLACEHOLDER,
        STREAMING_SIZE_PLACEHOLDER,
    );

    let mut header = [0u8; WAV_HEADER_LEN];
    header.copy_from_slice(&bytes);
    Ok(header)
}

/// Scale one sample to signed 16-bit PCM
///
/// NaN quantizes to 0.
pub fn quantize(sample: f32) -> i16 {
    let scaled = (sample.clamp(-1.0, 1.0) * ATTENUATION * i16::MAX as f32).round();
    scaled as i16
}

fn write_header(buf: &mut Vec<u8>, sample_rate: u32, byte_rate: u32, riff_len: u32, data_len: u32) {
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&riff_len.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    buf.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    buf.extend_from_slice(&CHANNELS.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&(CHANNELS * BITS_PER_SAMPLE / 8).to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
}
