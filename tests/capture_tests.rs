// Integration tests for single capture sessions
//
// These tests verify that a capture ends exactly once (stop, timeout or
// backend failure), always writes its audio, and clears its active flag
// before the completion is delivered.

use anyhow::{bail, Result};
use interview_coach::audio::{
    answer_path, save_answer, AudioBackend, AudioBackendConfig, AudioCaptureSession, AudioFrame, CaptureEnd,
    CaptureRequest, CapturedAudio, FileBackend, SimulatedBackend,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

const WAIT: Duration = Duration::from_secs(5);

fn request(dir: &Path, question_index: usize, max_duration: Duration) -> CaptureRequest {
    CaptureRequest {
        capture_id: Uuid::new_v4(),
        question_index,
        output_path: answer_path(dir, question_index),
        max_duration,
        sample_rate: 16000,
        channels: 1,
    }
}

/// Backend that sends a few frames, then drops its channel while still claiming to capture
struct BrokenBackend {
    capturing: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl AudioBackend for BrokenBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(4);
        self.capturing.store(true, Ordering::SeqCst);
        for i in 0..2 {
            tx.send(AudioFrame {
                samples: vec![7i16; 160],
                sample_rate: 16000,
                channels: 1,
                timestamp_ms: i * 10,
            })
            .await?;
        }
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Backend whose device cannot be opened
struct UnavailableBackend;

#[async_trait::async_trait]
impl AudioBackend for UnavailableBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        bail!("no input device")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

async fn completion(rx: &mut mpsc::Receiver<CapturedAudio>) -> Result<CapturedAudio> {
    match timeout(WAIT, rx.recv()).await? {
        Some(captured) => Ok(captured),
        None => bail!("capture ended without a completion"),
    }
}

#[tokio::test]
async fn test_stop_request_ends_capture() -> Result<()> {
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(4);
    let req = request(dir.path(), 1, Duration::from_secs(120));
    let path = req.output_path.clone();

    let session = AudioCaptureSession::start(Box::new(SimulatedBackend::new(AudioBackendConfig::default())), req, tx);
    assert!(session.is_active());
    assert!(session.request_stop());

    let captured = completion(&mut rx).await?;
    assert_eq!(captured.end, CaptureEnd::Stopped);
    assert_eq!(captured.capture_id, session.id());
    assert_eq!(captured.backend, "simulated");
    assert!(captured.samples.is_empty());

    // Inactive by the time the completion is observed
    assert!(!session.is_active());
    assert!(!session.request_stop(), "nothing left to stop");

    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.len(), 0);

    // Exactly one completion
    assert!(rx.recv().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_timeout_ends_capture_once() -> Result<()> {
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(4);

    let session = AudioCaptureSession::start(
        Box::new(SimulatedBackend::new(AudioBackendConfig::default())),
        request(dir.path(), 2, Duration::from_millis(50)),
        tx,
    );

    let captured = completion(&mut rx).await?;
    assert_eq!(captured.end, CaptureEnd::TimedOut);
    assert_eq!(captured.question_index, 2);
    assert!(!session.is_active());

    assert!(rx.recv().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_file_backend_replays_into_answer() -> Result<()> {
    let dir = TempDir::new()?;
    let source = dir.path().join("spoken.wav");
    let samples: Vec<i16> = (0..8000).map(|i| (i % 100) as i16).collect();
    save_answer(&source, &samples, 16000, 1)?;

    let (tx, mut rx) = mpsc::channel(4);
    let req = request(dir.path(), 1, Duration::from_secs(120));
    let path = req.output_path.clone();
    let session = AudioCaptureSession::start(
        Box::new(FileBackend::new(source, AudioBackendConfig::default())),
        req,
        tx,
    );

    // Draining the file does not end the capture; the stop request does
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(session.is_active());
    assert!(session.elapsed() >= Duration::from_millis(200));
    session.request_stop();

    let captured = completion(&mut rx).await?;
    assert_eq!(captured.end, CaptureEnd::Stopped);
    assert_eq!(captured.samples, samples);
    assert!((captured.duration_seconds() - 0.5).abs() < 0.01);

    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.len(), 8000);
    Ok(())
}

#[tokio::test]
async fn test_backend_failure_keeps_partial_audio() -> Result<()> {
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(4);
    let req = request(dir.path(), 3, Duration::from_secs(120));
    let path = req.output_path.clone();

    let _session = AudioCaptureSession::start(
        Box::new(BrokenBackend {
            capturing: Arc::new(AtomicBool::new(false)),
        }),
        req,
        tx,
    );

    let captured = completion(&mut rx).await?;
    assert!(matches!(captured.end, CaptureEnd::BackendFailed(_)));
    assert_eq!(captured.samples.len(), 320);

    let reader = hound::WavReader::open(&path)?;
    assert_eq!(reader.len(), 320);
    Ok(())
}

#[tokio::test]
async fn test_unavailable_backend_still_completes() -> Result<()> {
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(4);
    let req = request(dir.path(), 1, Duration::from_secs(120));
    let path = req.output_path.clone();

    let _session = AudioCaptureSession::start(Box::new(UnavailableBackend), req, tx);

    let captured = completion(&mut rx).await?;
    assert!(matches!(captured.end, CaptureEnd::BackendFailed(reason) if reason.contains("no input device")));
    assert!(path.exists());
    Ok(())
}

#[tokio::test]
async fn test_force_inactive_clears_flag_immediately() -> Result<()> {
    let dir = TempDir::new()?;
    let (tx, mut rx) = mpsc::channel(4);

    let session = AudioCaptureSession::start(
        Box::new(SimulatedBackend::new(AudioBackendConfig::default())),
        request(dir.path(), 1, Duration::from_secs(120)),
        tx,
    );

    session.force_inactive();
    assert!(!session.is_active());

    let captured = completion(&mut rx).await?;
    assert_eq!(captured.end, CaptureEnd::Stopped);
    Ok(())
}
