use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::CoachError;
use crate::openai::OpenAiClient;

/// Answer text recorded when transcription fails or hears nothing
pub const TRANSCRIPTION_PLACEHOLDER: &str = "[Transcription failed]";

/// Speech-to-text collaborator: `transcribe(audio) -> text`
#[async_trait::async_trait]
pub trait TranscriptionBackend: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String>;

    /// Backend name for logging and status reporting
    fn name(&self) -> &str;
}

/// Transcribe, substituting the placeholder for failures and empty results.
///
/// Returns the answer text and whether the placeholder was used.
pub async fn transcribe_or_placeholder(backend: &dyn TranscriptionBackend, audio: &Path) -> (String, bool) {
    match backend.transcribe(audio).await {
        Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), false),
        Ok(_) => {
            warn!("Transcription of {} was empty", audio.display());
            (TRANSCRIPTION_PLACEHOLDER.to_string(), true)
        }
        Err(e) => {
            warn!("Transcription of {} failed ({}): {:#}", audio.display(), backend.name(), e);
            (TRANSCRIPTION_PLACEHOLDER.to_string(), true)
        }
    }
}

/// Whisper transcription over the OpenAI API
pub struct OpenAiTranscription {
    client: Arc<OpenAiClient>,
}

impl OpenAiTranscription {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl TranscriptionBackend for OpenAiTranscription {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        info!("Transcribing {} with OpenAI", audio.display());

        let size = tokio::fs::metadata(audio).await.map(|m| m.len()).unwrap_or(0);
        // A bare WAV header carries no speech
        if size <= 44 {
            return Err(CoachError::InvalidRequest(format!("{} contains no audio", audio.display())).into());
        }

        self.client
            .transcribe(audio)
            .await
            .map_err(|e| CoachError::TransientServiceFailure(format!("{:#}", e)).into())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Canned answers used when no transcription service is available
const CANNED_ANSWERS: [&str; 7] = [
    "I've worked on several technical projects including a web application using React and Node.js...",
    "I ensure code quality by writing comprehensive test suites including unit and integration tests...",
    "When debugging complex problems, I first gather all available information including logs...",
    "I stay current with industry trends by following tech blogs...",
    "When working in teams, I value clear communication and well-defined responsibilities...",
    "My approach to learning new technologies is to build small projects that use core functionality...",
    "I believe my experience and passion for learning make me a good fit for this role...",
];

/// Transcriber that returns canned answers keyed by the question index in the filename
pub struct SimulatedTranscription;

impl SimulatedTranscription {
    pub fn canned_answer(audio: &Path) -> &'static str {
        let index = question_index_from_path(audio).unwrap_or(usize::MAX);
        CANNED_ANSWERS
            .get(index)
            .copied()
            .unwrap_or(CANNED_ANSWERS[CANNED_ANSWERS.len() - 1])
    }
}

#[async_trait::async_trait]
impl TranscriptionBackend for SimulatedTranscription {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        info!("Simulated transcription of {}", audio.display());
        Ok(Self::canned_answer(audio).to_string())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// `.../answer_3.wav` -> 3
fn question_index_from_path(audio: &Path) -> Option<usize> {
    audio
        .file_stem()?
        .to_str()?
        .strip_prefix("answer_")?
        .parse()
        .ok()
}
