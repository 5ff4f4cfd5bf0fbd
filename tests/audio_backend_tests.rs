// Integration tests for audio backends
//
// These tests verify backend selection and the start/stop lifecycle of the
// simulated and file-replay backends that stand in for a microphone.

use anyhow::Result;
use interview_coach::audio::{
    save_answer, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioSource, FileBackend, SimulatedBackend,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

#[test]
fn test_audio_backend_config_default() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.target_sample_rate, 16000, "Default should be 16kHz for Whisper");
    assert_eq!(config.target_channels, 1, "Default should be mono");
    assert_eq!(config.buffer_duration_ms, 100, "Default buffer should be 100ms");
}

#[test]
fn test_source_display_round_trips_through_config() -> Result<()> {
    for text in ["microphone", "simulated", "file:/tmp/demo.wav"] {
        let source: AudioSource = text.parse()?;
        assert_eq!(source.to_string(), text);
    }
    Ok(())
}

#[cfg(not(feature = "microphone"))]
#[test]
fn test_microphone_without_feature_degrades() {
    assert_eq!(AudioBackendFactory::probe(AudioSource::Microphone), AudioSource::Simulated);
    assert!(AudioBackendFactory::create(&AudioSource::Microphone, AudioBackendConfig::default()).is_err());

    let backend = AudioBackendFactory::create_or_simulated(&AudioSource::Microphone, AudioBackendConfig::default());
    assert_eq!(backend.name(), "simulated");
}

#[tokio::test]
async fn test_simulated_backend_stays_open_until_stopped() -> Result<()> {
    let mut backend = SimulatedBackend::new(AudioBackendConfig::default());

    let mut rx = backend.start().await?;
    assert!(backend.is_capturing());
    assert!(backend.start().await.is_err(), "a backend serves one capture at a time");

    // No frames, but the channel is still open
    assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());

    backend.stop().await?;
    assert!(!backend.is_capturing());
    assert!(rx.recv().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_file_backend_drains_then_clears_flag() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("input.wav");
    save_answer(&path, &vec![100i16; 3200], 16000, 1)?;

    let mut backend = FileBackend::new(path, AudioBackendConfig::default());
    let mut rx = backend.start().await?;

    let mut frames = 0;
    let mut samples = 0;
    while let Some(frame) = timeout(Duration::from_secs(5), rx.recv()).await? {
        assert_eq!(frame.sample_rate, 16000);
        assert_eq!(frame.timestamp_ms, frames * 100);
        frames += 1;
        samples += frame.samples.len();
    }

    // 200ms of audio in 100ms frames
    assert_eq!(frames, 2);
    assert_eq!(samples, 3200);
    assert!(!backend.is_capturing(), "a drained file is not a failure");

    backend.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_file_backend_missing_file_fails_to_start() {
    let mut backend = FileBackend::new("/nonexistent/input.wav".into(), AudioBackendConfig::default());
    assert!(backend.start().await.is_err());
    assert!(!backend.is_capturing());
}
