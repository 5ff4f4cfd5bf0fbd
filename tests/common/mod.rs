// Shared helpers for integration tests: offline backends and a coach wired to them

#![allow(dead_code)]

use anyhow::{bail, Result};
use interview_coach::services::{
    ContentBackend, PrintedSpeech, SimulatedTranscription, TranscriptionBackend, UnavailableContent,
};
use interview_coach::{AudioSource, Backends, Config, InterviewCoach, SessionSnapshot, StartInterview};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

pub const WAIT: Duration = Duration::from_secs(5);

/// Transcription that always fails
pub struct FailingTranscription;

#[async_trait::async_trait]
impl TranscriptionBackend for FailingTranscription {
    async fn transcribe(&self, _audio: &Path) -> Result<String> {
        bail!("transcription service unreachable")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Transcription that holds the turn in processing until released
pub struct GatedTranscription {
    pub gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl TranscriptionBackend for GatedTranscription {
    async fn transcribe(&self, _audio: &Path) -> Result<String> {
        self.gate.notified().await;
        Ok("A gated answer".to_string())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Transcription whose first call waits for the gate; later calls answer at once
pub struct FirstCallGated {
    pub gate: Arc<Notify>,
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TranscriptionBackend for FirstCallGated {
    async fn transcribe(&self, _audio: &Path) -> Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
            return Ok("A late answer".to_string());
        }
        Ok("A prompt answer".to_string())
    }

    fn name(&self) -> &str {
        "first-call-gated"
    }
}

pub fn test_config(dir: &TempDir, max_recording_secs: u64) -> Config {
    let mut cfg = Config::default();
    cfg.audio.recordings_path = dir.path().display().to_string();
    cfg.audio.max_recording_secs = max_recording_secs;
    cfg.interview.welcome_pause_ms = 0;
    cfg
}

pub fn offline_backends(transcription: Arc<dyn TranscriptionBackend>) -> Backends {
    let content: Arc<dyn ContentBackend> = Arc::new(UnavailableContent::new("offline tests"));
    Backends {
        content,
        transcription,
        speech: Arc::new(PrintedSpeech::new(0.0)),
        speech_fallback: Arc::new(PrintedSpeech::new(0.0)),
        audio: AudioSource::Simulated,
    }
}

pub fn offline_coach(dir: &TempDir) -> InterviewCoach {
    InterviewCoach::with_backends(&test_config(dir, 120), offline_backends(Arc::new(SimulatedTranscription)))
}

pub fn interview(job: &str, count: usize) -> StartInterview {
    StartInterview {
        job: job.to_string(),
        num_questions: Some(count),
        ..StartInterview::default()
    }
}

/// Poll the snapshot until `ready` holds or the wait expires
pub async fn wait_for(coach: &InterviewCoach, ready: impl Fn(&SessionSnapshot) -> bool) -> Result<SessionSnapshot> {
    let deadline = tokio::time::Instant::now() + WAIT;
    loop {
        let snapshot = coach.snapshot().await;
        if ready(&snapshot) {
            return Ok(snapshot);
        }
        if tokio::time::Instant::now() > deadline {
            bail!("timed out waiting for session state: {:?}", snapshot);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Start an interview and wait for the welcome to open question 1
pub async fn started_interview(coach: &InterviewCoach, job: &str, count: usize) -> Result<SessionSnapshot> {
    coach.start_interview(interview(job, count)).await?;
    wait_for(coach, |s| s.current_question_index == 1).await
}

pub fn assert_turn_invariant(snapshot: &SessionSnapshot) {
    assert_eq!(snapshot.answers.len(), snapshot.feedbacks.len());
    if snapshot.current_question_index >= 1 {
        assert!(snapshot.answers.len() as i64 <= snapshot.current_question_index);
    }
}
