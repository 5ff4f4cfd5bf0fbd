//! External collaborators: text generation, transcription and speech,
//! each with a primary implementation and a fallback.

pub mod content;
pub mod evaluator;
pub mod questions;
pub mod speech;
pub mod transcription;

pub use content::{ContentBackend, OpenAiContent, UnavailableContent};
pub use evaluator::{canned_feedback, Evaluation, Evaluator};
pub use questions::{normalize_job, QuestionGenerator, QuestionSet};
pub use speech::{
    command_available, validate_voice, OpenAiSpeech, PrintedSpeech, Speaker, SpeechBackend, SpeechTicket,
    SystemSpeech, DEFAULT_VOICE, VOICES,
};
pub use transcription::{
    transcribe_or_placeholder, OpenAiTranscription, SimulatedTranscription, TranscriptionBackend,
    TRANSCRIPTION_PLACEHOLDER,
};
