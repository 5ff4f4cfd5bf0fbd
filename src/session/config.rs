use serde::{Deserialize, Serialize};

/// Settings captured when an interview starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Job title the candidate is practicing for
    pub job: String,

    /// Number of real questions (the welcome message is not counted)
    pub question_count: usize,

    /// Name the interviewer introduces itself with
    pub interviewer_name: String,

    /// Voice used for every utterance in this interview
    pub interviewer_voice: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            job: String::new(),
            question_count: 3,
            interviewer_name: "Kashmala".to_string(),
            interviewer_voice: "shimmer".to_string(),
        }
    }
}
