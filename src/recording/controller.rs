use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use crate::audio::{
    answer_path, AudioBackendConfig, AudioBackendFactory, AudioCaptureSession, AudioSource, CaptureRequest,
    CapturedAudio,
};
use crate::error::CoachError;
use crate::session::{InterviewSession, SharedSession};

/// Where and how captures are made
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub source: AudioSource,
    pub backend: AudioBackendConfig,
    pub recordings_dir: PathBuf,
    pub max_duration: Duration,
}

/// Returned when a recording has been launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStarted {
    pub capture_id: Uuid,
    pub question_index: usize,
    pub path: PathBuf,
}

/// What a stop request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The running capture was asked to finish
    Requested,
    /// The capture had already ended and its completion is on its way
    AlreadyFinishing,
}

/// Start/stop/reset over the single capture slot.
///
/// Lock order is always session, then capture slot. Both locks are held only
/// for flag flips and handle swaps; the capture itself runs on its own task.
pub struct RecordingController {
    session: SharedSession,
    capture: Mutex<Option<AudioCaptureSession>>,
    settings: CaptureSettings,
    completions: mpsc::Sender<CapturedAudio>,
}

impl RecordingController {
    pub fn new(session: SharedSession, settings: CaptureSettings, completions: mpsc::Sender<CapturedAudio>) -> Self {
        Self {
            session,
            capture: Mutex::new(None),
            settings,
            completions,
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Launch a capture for the current question and return immediately
    pub async fn start(&self) -> Result<RecordingStarted, CoachError> {
        let mut session = self.session.lock().await;
        let mut slot = self.capture.lock().await;

        if slot.as_ref().is_some_and(AudioCaptureSession::is_active) {
            return Err(CoachError::AlreadyActive);
        }

        let capture_id = Uuid::new_v4();
        let question_index = session.begin_recording(capture_id)?;
        let path = answer_path(&self.settings.recordings_dir, question_index);

        let backend = AudioBackendFactory::create_or_simulated(&self.settings.source, self.settings.backend.clone());
        let request = CaptureRequest {
            capture_id,
            question_index,
            output_path: path.clone(),
            max_duration: self.settings.max_duration,
            sample_rate: self.settings.backend.target_sample_rate,
            channels: self.settings.backend.target_channels,
        };

        *slot = Some(AudioCaptureSession::start(backend, request, self.completions.clone()));

        info!("Recording started for question {}", question_index);

        Ok(RecordingStarted {
            capture_id,
            question_index,
            path,
        })
    }

    /// Ask the running capture to finish.
    ///
    /// Leaves the session in `Recording`; the turn sequencer moves it on
    /// once the capture has flushed its audio.
    pub async fn stop(&self) -> Result<StopOutcome, CoachError> {
        let session = self.session.lock().await;
        let capture_id = session.recording_capture()?;

        let slot = self.capture.lock().await;
        let outcome = match slot.as_ref().filter(|c| c.id() == capture_id) {
            Some(capture) if capture.request_stop() => StopOutcome::Requested,
            _ => StopOutcome::AlreadyFinishing,
        };

        info!("Stop recording: {:?}", outcome);
        Ok(outcome)
    }

    /// Force the session out of recording/processing and drop any capture.
    ///
    /// Safe to call at any time; a second call changes nothing.
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        let mut slot = self.capture.lock().await;

        let abandoned = session.reset_flags();
        let held_for = slot.take().map(|capture| {
            capture.force_inactive();
            capture.elapsed()
        });

        match (abandoned, held_for) {
            (Some(id), Some(held)) => warn!(
                "Recording state reset; capture {} abandoned after {:.1}s",
                id,
                held.as_secs_f64()
            ),
            (Some(id), None) => warn!("Recording state reset; capture {} abandoned", id),
            (None, _) => info!("Recording state reset"),
        }
    }

    /// Swap in a fresh interview, abandoning any capture of the old one.
    ///
    /// Returns the new session id. Completions from the abandoned capture
    /// no longer match and are dropped by the sequencer.
    pub async fn replace_session(&self, fresh: InterviewSession) -> Uuid {
        let mut session = self.session.lock().await;
        let mut slot = self.capture.lock().await;

        if let Some(capture) = slot.take() {
            capture.force_inactive();
            info!(
                "Abandoned capture {} of the previous interview after {:.1}s",
                capture.id(),
                capture.elapsed().as_secs_f64()
            );
        }

        *session = fresh;
        session.id()
    }
}
