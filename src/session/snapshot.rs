use super::session::TurnPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only view of the interview, served to polling clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Absent until the first interview starts
    pub session_id: Option<Uuid>,

    pub job: String,

    /// -1 until the welcome message has been spoken, then 1-based into `questions`
    pub current_question_index: i64,

    /// Welcome message followed by the real questions
    pub questions: Vec<String>,

    pub answers: Vec<String>,

    pub feedbacks: Vec<String>,

    /// Completed turns with their questions already lined up
    pub turns: Vec<TurnRecord>,

    pub phase: TurnPhase,

    pub is_recording: bool,

    pub is_processing: bool,

    pub is_complete: bool,

    /// Recording or processing has lasted suspiciously long; only a reset clears it
    pub stuck: bool,

    /// When the current recording or processing phase began
    pub phase_started_at: Option<DateTime<Utc>>,

    pub started_at: Option<DateTime<Utc>>,

    pub interviewer_name: String,

    pub interviewer_voice: String,
}

/// One completed question/answer/feedback cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Index into `questions`
    pub question_index: usize,

    pub question: String,

    pub answer: String,

    pub feedback: String,
}
