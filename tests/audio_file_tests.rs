// Integration tests for file-backed capture
//
// These tests verify that a WAV file can stand in for the microphone and
// that its bytes arrive complete and in order.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use voice_capture::audio::{AudioFile, FileMediaDevices};
use voice_capture::{
    encode_wav, CaptureConfig, CaptureController, CaptureError, MediaDevices, MicrophoneStream,
};

fn get_test_fixture_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(filename)
}

fn write_wav(dir: &TempDir, name: &str, samples: &[f32], sample_rate: u32) -> Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, encode_wav(samples, sample_rate)?.as_bytes())?;
    Ok(path)
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let path = get_test_fixture_path("voice.wav");

    let audio = AudioFile::open(&path)?;

    assert!(audio.duration_seconds > 0.0, "Duration should be positive");
    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.bits_per_sample, 16);
    assert_eq!(audio.byte_rate(), 32000);
    assert!(audio.path.contains("voice.wav"));

    Ok(())
}

#[test]
fn test_audio_file_keeps_raw_bytes() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "short.wav", &[0.1; 400], 8000)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.bytes, std::fs::read(&path)?);
    assert!((audio.duration_seconds - 0.05).abs() < 1e-6);

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[tokio::test]
async fn test_missing_input_file_is_permission_denied() {
    let devices = FileMediaDevices::new("/nonexistent/voice.wav");

    let err = devices.open_microphone().await.err().expect("should fail");

    assert!(matches!(err, CaptureError::PermissionDenied(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_file_replay_delivers_every_byte_in_order() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(&dir, "replay.wav", &[0.0; 2000], 16000)?;
    let expected = std::fs::read(&path)?;

    let devices = FileMediaDevices::new(&path);
    let mut mic = devices.open_microphone().await?;

    // 16kHz mono 16-bit at 10ms = 320 byte chunks
    let mut rx = mic.start(Duration::from_millis(10)).await?;
    tokio::time::sleep(Duration::from_millis(35)).await;
    mic.stop().await?;

    let mut received = Vec::new();
    let mut chunk_count = 0;
    while let Some(chunk) = rx.recv().await {
        received.extend_from_slice(&chunk);
        chunk_count += 1;
    }

    assert_eq!(received, expected);
    assert!(chunk_count >= 2, "Expected incremental chunks, got {}", chunk_count);

    assert!(mic.tracks_live());
    mic.release_tracks();
    assert!(!mic.tracks_live());

    Ok(())
}

#[tokio::test]
async fn test_file_backed_recording_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let samples: Vec<f32> = (0..8000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
    let path = write_wav(&dir, "speech.wav", &samples, 16000)?;

    let devices = std::sync::Arc::new(FileMediaDevices::new(&path));
    let mut controller = CaptureController::with_devices(devices, CaptureConfig::with_chunk_interval_ms(20));

    controller.start_recording().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let wav = controller.stop_recording().await?;

    assert_eq!(wav.sample_count(), samples.len());
    assert_eq!(wav.sample_rate(), 16000);

    // Input was already attenuated once; the second pass scales it again
    let first = i16::from_le_bytes([wav.as_bytes()[44], wav.as_bytes()[45]]);
    let expected = (((0.5f32 * 0.8 * 32767.0).round() / 32768.0) * 0.8 * 32767.0).round() as i16;
    assert!((first - expected).abs() <= 1, "got {} expected {}", first, expected);

    Ok(())
}
