// Tests for PCM to WAV encoding
//
// These tests verify the exact byte layout the transcription endpoint
// expects: a fixed 44-byte header followed by attenuated 16-bit samples.

use anyhow::Result;
use std::io::Cursor;
use voice_capture::audio::wav::{encode_wav, ATTENUATION, WAV_HEADER_LEN};
use voice_capture::{DecodedAudioBuffer, EncodeError};

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn i16_at(bytes: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[test]
fn test_header_fields_for_various_lengths_and_rates() -> Result<()> {
    for &n in &[0usize, 1, 2, 977, 16000] {
        for &rate in &[1u32, 8000, 16000, 44100, 48000] {
            let wav = encode_wav(&vec![0.0; n], rate)?;
            let bytes = wav.as_bytes();

            assert_eq!(bytes.len(), 44 + 2 * n, "length for n={} r={}", n, rate);
            assert_eq!(&bytes[0..4], b"RIFF");
            assert_eq!(u32_at(bytes, 4), 32 + 2 * n as u32);
            assert_eq!(&bytes[8..12], b"WAVE");
            assert_eq!(&bytes[12..16], b"fmt ");
            assert_eq!(u32_at(bytes, 16), 16);
            assert_eq!(u16_at(bytes, 20), 1, "PCM format tag");
            assert_eq!(u16_at(bytes, 22), 1, "mono");
            assert_eq!(u32_at(bytes, 24), rate);
            assert_eq!(u32_at(bytes, 28), rate * 2, "byte rate");
            assert_eq!(u16_at(bytes, 32), 2, "block align");
            assert_eq!(u16_at(bytes, 34), 16, "bits per sample");
            assert_eq!(&bytes[36..40], b"data");
            assert_eq!(u32_at(bytes, 40), 2 * n as u32);
        }
    }

    Ok(())
}

#[test]
fn test_full_scale_samples() -> Result<()> {
    let wav = encode_wav(&[1.0, -1.0], 16000)?;
    let bytes = wav.as_bytes();

    assert_eq!(i16_at(bytes, 44), 26214);
    assert_eq!(i16_at(bytes, 46), -26214);
    assert_eq!(&bytes[44..48], &[0x66, 0x66, 0x9a, 0x99]);

    Ok(())
}

#[test]
fn test_out_of_range_samples_are_clamped() -> Result<()> {
    let wav = encode_wav(&[1.5, 1.0, -7.0, -1.0, f32::INFINITY], 16000)?;
    let bytes = wav.as_bytes();

    assert_eq!(i16_at(bytes, 44), i16_at(bytes, 46));
    assert_eq!(i16_at(bytes, 48), i16_at(bytes, 50));
    assert_eq!(i16_at(bytes, 52), 26214);

    Ok(())
}

#[test]
fn test_samples_are_written_in_order_after_header() -> Result<()> {
    let samples = [0.0, 0.25, -0.25, 0.5];
    let wav = encode_wav(&samples, 8000)?;
    let bytes = wav.as_bytes();

    for (i, &s) in samples.iter().enumerate() {
        let expected = (s * ATTENUATION * 32767.0).round() as i16;
        assert_eq!(i16_at(bytes, WAV_HEADER_LEN + 2 * i), expected, "sample {}", i);
    }

    Ok(())
}

#[test]
fn test_empty_input_is_a_valid_header() -> Result<()> {
    let wav = encode_wav(&[], 16000)?;

    assert_eq!(wav.len(), 44);
    assert!(wav.is_empty());
    assert_eq!(u32_at(wav.as_bytes(), 40), 0);

    let reader = hound::WavReader::new(Cursor::new(wav.into_bytes()))?;
    assert_eq!(reader.len(), 0);

    Ok(())
}

#[test]
fn test_zero_sample_rate_is_rejected() {
    assert_eq!(
        encode_wav(&[0.0], 0).unwrap_err(),
        EncodeError::InvalidSampleRate(0)
    );
}

#[test]
fn test_output_reads_back_with_hound() -> Result<()> {
    let samples: Vec<f32> = (0..1600)
        .map(|i| (i as f32 * 0.05).sin())
        .collect();
    let wav = encode_wav(&samples, 16000)?;

    let mut reader = hound::WavReader::new(Cursor::new(wav.as_bytes().to_vec()))?;
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let decoded: Vec<i16> = reader.samples::<i16>().collect::<Result<_, _>>()?;
    assert_eq!(decoded.len(), samples.len());
    for (&pcm, &s) in decoded.iter().zip(&samples) {
        let expected = (s * ATTENUATION * 32767.0).round() as i16;
        assert_eq!(pcm, expected);
    }

    Ok(())
}

#[test]
fn test_container_metadata() -> Result<()> {
    let buffer = DecodedAudioBuffer::new(vec![0.0; 8000], 16000)?;
    let wav = voice_capture::audio::encode_buffer(&buffer)?;

    assert_eq!(wav.sample_count(), 8000);
    assert_eq!(wav.sample_rate(), 16000);
    assert!((wav.duration_seconds() - 0.5).abs() < 1e-9);

    Ok(())
}
