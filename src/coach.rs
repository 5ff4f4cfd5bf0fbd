//! The interview coach: one process-wide session plus the collaborators
//! that drive it.
//!
//! Every outer surface (HTTP, terminal) talks to an `InterviewCoach` and
//! nothing else.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::{AudioBackendConfig, AudioBackendFactory, AudioSource};
use crate::config::Config;
use crate::error::CoachError;
use crate::openai::OpenAiClient;
use crate::recording::{
    CaptureSettings, RecordingController, RecordingStarted, StopOutcome, TurnOutcome, TurnSequencer,
};
use crate::services::{
    command_available, validate_voice, ContentBackend, Evaluator, OpenAiContent, OpenAiSpeech,
    OpenAiTranscription, PrintedSpeech, QuestionGenerator, SimulatedTranscription, Speaker, SpeechBackend,
    SystemSpeech, TranscriptionBackend, UnavailableContent,
};
use crate::session::{InterviewSession, SessionConfig, SessionSnapshot, SharedSession};

/// Capacity of the capture completion channel
const COMPLETION_QUEUE: usize = 8;

/// Collaborators chosen at startup
pub struct Backends {
    pub content: Arc<dyn ContentBackend>,
    pub transcription: Arc<dyn TranscriptionBackend>,
    pub speech: Arc<dyn SpeechBackend>,
    pub speech_fallback: Arc<dyn SpeechBackend>,
    pub audio: AudioSource,
}

impl Backends {
    /// Probe the machine and configuration once and pick a backend for each concern
    pub fn probe(cfg: &Config) -> Result<Self> {
        let client = match OpenAiClient::from_config(&cfg.openai) {
            Ok(client) => client.map(Arc::new),
            Err(e) => {
                warn!("{:#}; using offline fallbacks", e);
                None
            }
        };

        let content: Arc<dyn ContentBackend> = match &client {
            Some(client) => Arc::new(OpenAiContent::new(Arc::clone(client))),
            None => Arc::new(UnavailableContent::new("no OpenAI API key configured")),
        };

        let transcription: Arc<dyn TranscriptionBackend> = match &client {
            Some(client) => Arc::new(OpenAiTranscription::new(Arc::clone(client))),
            None => Arc::new(SimulatedTranscription),
        };

        let printed: Arc<dyn SpeechBackend> = Arc::new(PrintedSpeech::new(cfg.speech.seconds_per_word));
        let system: Option<Arc<dyn SpeechBackend>> = command_available(&cfg.speech.system_command)
            .then(|| Arc::new(SystemSpeech::new(cfg.speech.system_command.clone())) as Arc<dyn SpeechBackend>);

        let player = cfg.speech.player_command();
        let (speech, speech_fallback) = match (&client, system) {
            (Some(client), system) if command_available(&player) => {
                let scratch = std::env::temp_dir().join("interview-coach");
                let primary: Arc<dyn SpeechBackend> = Arc::new(OpenAiSpeech::new(Arc::clone(client), player, scratch));
                (primary, system.unwrap_or_else(|| Arc::clone(&printed)))
            }
            (_, Some(system)) => (system, Arc::clone(&printed)),
            (_, None) => (Arc::clone(&printed), printed),
        };

        let audio = AudioBackendFactory::probe(cfg.audio.source.parse()?);

        info!(
            "Backends: content={}, transcription={}, speech={} (fallback {}), audio={}",
            content.name(),
            transcription.name(),
            speech.name(),
            speech_fallback.name(),
            audio
        );

        Ok(Self {
            content,
            transcription,
            speech,
            speech_fallback,
            audio,
        })
    }
}

/// Parameters of `start_interview`; omitted fields use configured defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartInterview {
    #[serde(default)]
    pub job: String,
    pub num_questions: Option<usize>,
    pub interviewer_name: Option<String>,
    pub interviewer_voice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewStarted {
    pub session_id: Uuid,
    pub job: String,
    /// Welcome message followed by the questions
    pub questions: Vec<String>,
    pub using_openai_tts: bool,
}

/// Which collaborators are in use right now
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub content: String,
    pub transcription: String,
    pub active_voice: String,
    pub voice_fallback: String,
    pub using_openai_tts: bool,
    pub audio: String,
}

pub struct InterviewCoach {
    session: SharedSession,
    controller: RecordingController,
    sequencer: Arc<TurnSequencer>,
    questions: QuestionGenerator,
    speaker: Speaker,
    content_name: String,
    transcription_name: String,
    defaults: SessionConfig,
    welcome_pause: Duration,
    stuck_after: Duration,
    welcome: Mutex<Option<JoinHandle<()>>>,
    sequencer_task: JoinHandle<()>,
}

impl InterviewCoach {
    /// Probe backends and build the coach. Must run inside a Tokio runtime.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let backends = Backends::probe(cfg)?;
        Ok(Self::with_backends(cfg, backends))
    }

    /// Build the coach around explicit collaborators. Must run inside a Tokio runtime.
    pub fn with_backends(cfg: &Config, backends: Backends) -> Self {
        let session = InterviewSession::default().shared();
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_QUEUE);

        let settings = CaptureSettings {
            source: backends.audio,
            backend: AudioBackendConfig {
                target_sample_rate: cfg.audio.sample_rate,
                target_channels: cfg.audio.channels,
                ..AudioBackendConfig::default()
            },
            recordings_dir: cfg.audio.recordings_dir(),
            max_duration: cfg.audio.max_recording_duration(),
        };

        let speaker = Speaker::spawn(backends.speech, backends.speech_fallback);
        let evaluator = Arc::new(Evaluator::new(Arc::clone(&backends.content)));
        let sequencer = Arc::new(TurnSequencer::new(
            Arc::clone(&session),
            Arc::clone(&backends.transcription),
            evaluator,
            speaker.clone(),
        ));
        let sequencer_task = Arc::clone(&sequencer).spawn(completions_rx);

        let defaults = SessionConfig {
            job: String::new(),
            question_count: cfg.interview.default_questions,
            interviewer_name: cfg.interview.interviewer_name.clone(),
            interviewer_voice: cfg.interview.interviewer_voice.clone(),
        };

        Self {
            controller: RecordingController::new(Arc::clone(&session), settings, completions_tx),
            session,
            sequencer,
            questions: QuestionGenerator::new(Arc::clone(&backends.content)),
            speaker,
            content_name: backends.content.name().to_string(),
            transcription_name: backends.transcription.name().to_string(),
            defaults,
            welcome_pause: Duration::from_millis(cfg.interview.welcome_pause_ms),
            stuck_after: Duration::from_secs(cfg.interview.stuck_after_secs),
            welcome: Mutex::new(None),
            sequencer_task,
        }
    }

    /// Replace the current interview with a fresh one and start the welcome sequence
    pub async fn start_interview(&self, request: StartInterview) -> Result<InterviewStarted, CoachError> {
        let job = request.job.trim().to_string();
        if job.is_empty() {
            return Err(CoachError::InvalidRequest("Job role is required".to_string()));
        }

        let count = request.num_questions.unwrap_or(self.defaults.question_count);
        if count == 0 {
            return Err(CoachError::InvalidRequest("num_questions must be at least 1".to_string()));
        }

        let interviewer_name = request
            .interviewer_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.defaults.interviewer_name.clone());
        let voice = validate_voice(
            request
                .interviewer_voice
                .as_deref()
                .unwrap_or(&self.defaults.interviewer_voice),
        )
        .to_string();

        info!("Starting interview for {} ({} questions, {} / {})", job, count, interviewer_name, voice);

        // Generation can take seconds; the old session stays live meanwhile
        let set = self
            .questions
            .generate(&job, count, &interviewer_name)
            .await
            .map_err(|e| match e.downcast::<CoachError>() {
                Ok(coach) => coach,
                Err(other) => CoachError::TransientServiceFailure(format!("Error generating questions: {:#}", other)),
            })?;

        let config = SessionConfig {
            job: job.clone(),
            question_count: count,
            interviewer_name,
            interviewer_voice: voice.clone(),
        };
        let fresh = InterviewSession::new(config, set.welcome.clone(), set.questions);
        let questions = fresh.questions().to_vec();

        // Held across replace and spawn so the live session owns the welcome task
        let mut welcome = self.welcome.lock().await;
        let session_id = self.controller.replace_session(fresh).await;
        if let Some(previous) = welcome.take() {
            previous.abort();
        }
        *welcome = Some(self.spawn_welcome(session_id, set.welcome, voice));

        Ok(InterviewStarted {
            session_id,
            job,
            questions,
            using_openai_tts: self.speaker.active_backend() == "openai",
        })
    }

    /// Speak the welcome, pause, then open and speak the first question
    fn spawn_welcome(&self, session_id: Uuid, welcome: String, voice: String) -> JoinHandle<()> {
        let session = Arc::clone(&self.session);
        let speaker = self.speaker.clone();
        let pause = self.welcome_pause;

        tokio::spawn(async move {
            speaker.say(welcome, &voice).wait().await;
            tokio::time::sleep(pause).await;

            let first = session.lock().await.open_first_question(session_id);
            match first {
                Some(question) => {
                    info!("First question: {}", question);
                    speaker.say(question, &voice);
                }
                None => debug!("Welcome for session {} is stale; not opening questions", session_id),
            }
        })
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot(self.stuck_after)
    }

    pub async fn start_recording(&self) -> Result<RecordingStarted, CoachError> {
        self.controller.start().await
    }

    pub async fn stop_recording(&self) -> Result<StopOutcome, CoachError> {
        self.controller.stop().await
    }

    pub async fn reset_recording(&self) {
        self.controller.reset().await
    }

    /// Outcomes of turns processed from now on
    pub fn subscribe_turns(&self) -> broadcast::Receiver<TurnOutcome> {
        self.sequencer.subscribe()
    }

    /// Give the primary voice another chance after a failure, then report status
    pub fn recheck_voice(&self) -> BackendStatus {
        if self.speaker.recheck() {
            info!("Retrying {} speech on the next utterance", self.speaker.active_backend());
        }
        self.backend_status()
    }

    pub fn backend_status(&self) -> BackendStatus {
        let active_voice = self.speaker.active_backend().to_string();
        BackendStatus {
            using_openai_tts: active_voice == "openai",
            content: self.content_name.clone(),
            transcription: self.transcription_name.clone(),
            active_voice,
            voice_fallback: self.speaker.fallback_backend().to_string(),
            audio: self.controller.settings().source.to_string(),
        }
    }
}

impl Drop for InterviewCoach {
    fn drop(&mut self) {
        self.sequencer_task.abort();
    }
}
