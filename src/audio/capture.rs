//! One bounded recording attempt.
//!
//! An `AudioCaptureSession` runs on its own task and ends in exactly one of
//! three ways: an explicit stop request, the maximum duration elapsing, or
//! the audio backend failing. Whatever happens, the buffered audio (possibly
//! empty) is written to the output path, the session's `active` flag is
//! cleared, and a single `CapturedAudio` is delivered on the completion
//! channel.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::backend::AudioBackend;
use super::wav::save_answer;

/// Default upper bound for a single answer
pub const MAX_CAPTURE_DURATION: Duration = Duration::from_secs(120);

/// Everything a capture needs to know before it starts
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub capture_id: Uuid,
    /// Question this answer belongs to (index into the session's question list)
    pub question_index: usize,
    /// Where the captured audio is written
    pub output_path: PathBuf,
    pub max_duration: Duration,
    /// Format used when the backend delivers no frames
    pub sample_rate: u32,
    pub channels: u16,
}

/// How a capture ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEnd {
    Stopped,
    TimedOut,
    BackendFailed(String),
}

/// Result handed to the turn sequencer
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    pub capture_id: Uuid,
    pub question_index: usize,
    pub path: PathBuf,
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    pub end: CaptureEnd,
    pub elapsed: Duration,
    pub backend: String,
}

impl CapturedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate.max(1) as f64 * self.channels.max(1) as f64)
    }
}

/// Clears the active flag however the capture task exits, panics included
struct ActiveFlag(Arc<AtomicBool>);

impl Drop for ActiveFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle to a running capture
pub struct AudioCaptureSession {
    id: Uuid,
    active: Arc<AtomicBool>,
    stop: CancellationToken,
    started_at: Instant,
}

impl AudioCaptureSession {
    /// Launch a capture on its own task and return immediately
    pub fn start(
        backend: Box<dyn AudioBackend>,
        request: CaptureRequest,
        completion: mpsc::Sender<CapturedAudio>,
    ) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let stop = CancellationToken::new();

        info!(
            "Starting capture {} for question {} ({}, max {}s) -> {}",
            request.capture_id,
            request.question_index,
            backend.name(),
            request.max_duration.as_secs(),
            request.output_path.display()
        );

        let id = request.capture_id;
        tokio::spawn(Self::run(
            backend,
            request,
            stop.clone(),
            ActiveFlag(Arc::clone(&active)),
            completion,
        ));

        Self {
            id,
            active,
            stop,
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Time since the capture was launched
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Ask the capture to finish. Returns false if it had already ended.
    ///
    /// The capture observes the request asynchronously; callers learn the
    /// outcome from the completion channel, not from this return value.
    pub fn request_stop(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        info!("Stop requested for capture {}", self.id);
        self.stop.cancel();
        true
    }

    /// Operator escape hatch: stop the capture and clear its active flag now
    pub fn force_inactive(&self) {
        self.stop.cancel();
        self.active.store(false, Ordering::SeqCst);
    }

    async fn run(
        mut backend: Box<dyn AudioBackend>,
        request: CaptureRequest,
        stop: CancellationToken,
        active: ActiveFlag,
        completion: mpsc::Sender<CapturedAudio>,
    ) {
        let started = Instant::now();
        let mut samples = Vec::new();
        let mut sample_rate = request.sample_rate;
        let mut channels = request.channels;

        let end = Self::capture(
            backend.as_mut(),
            &request,
            &stop,
            &mut samples,
            &mut sample_rate,
            &mut channels,
        )
        .await;

        if let Err(e) = backend.stop().await {
            error!("Failed to stop audio backend: {:#}", e);
        }

        let elapsed = started.elapsed();
        match &end {
            CaptureEnd::Stopped => info!(
                "Capture {} stopped after {:.1}s ({} samples)",
                request.capture_id,
                elapsed.as_secs_f64(),
                samples.len()
            ),
            CaptureEnd::TimedOut => warn!(
                "Capture {} timed out after {} seconds",
                request.capture_id,
                request.max_duration.as_secs()
            ),
            CaptureEnd::BackendFailed(reason) => error!(
                "Capture {} ended by backend failure: {} (keeping {} samples)",
                request.capture_id,
                reason,
                samples.len()
            ),
        }

        if samples.is_empty() {
            warn!("No audio recorded for question {}", request.question_index);
        }

        if let Err(e) = save_answer(&request.output_path, &samples, sample_rate, channels) {
            error!("Failed to save answer audio: {:#}", e);
        }

        let captured = CapturedAudio {
            capture_id: request.capture_id,
            question_index: request.question_index,
            path: request.output_path,
            samples,
            sample_rate,
            channels,
            end,
            elapsed,
            backend: backend.name().to_string(),
        };

        // Last act before handing off: the capture is no longer active
        drop(active);

        if completion.send(captured).await.is_err() {
            warn!("Turn sequencer is gone; dropping capture {}", request.capture_id);
        }
    }

    async fn capture(
        backend: &mut dyn AudioBackend,
        request: &CaptureRequest,
        stop: &CancellationToken,
        samples: &mut Vec<i16>,
        sample_rate: &mut u32,
        channels: &mut u16,
    ) -> CaptureEnd {
        let mut frames = match backend.start().await {
            Ok(rx) => rx,
            Err(e) => return CaptureEnd::BackendFailed(format!("{:#}", e)),
        };

        let deadline = tokio::time::sleep(request.max_duration);
        tokio::pin!(deadline);
        let mut stream_open = true;

        loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => return CaptureEnd::Stopped,

                _ = &mut deadline => return CaptureEnd::TimedOut,

                frame = frames.recv(), if stream_open => match frame {
                    Some(frame) => {
                        *sample_rate = frame.sample_rate;
                        *channels = frame.channels;
                        samples.extend_from_slice(&frame.samples);
                    }
                    None if backend.is_capturing() => {
                        return CaptureEnd::BackendFailed("audio stream closed unexpectedly".to_string());
                    }
                    None => {
                        debug!("Audio source drained; waiting for stop or timeout");
                        stream_open = false;
                    }
                },
            }
        }
    }
}
