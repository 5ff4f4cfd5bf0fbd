use thiserror::Error;

/// Errors surfaced by the interview control surface.
///
/// Failures inside a turn never reach this type: transcription and evaluation
/// degrade to placeholder or canned text and the interview keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoachError {
    /// A capture is already running or the previous turn is still processing
    #[error("Already recording or processing")]
    AlreadyActive,

    /// Stop requested while nothing is recording
    #[error("Not currently recording")]
    NotRecording,

    /// Recording requested before the first question was asked
    #[error("Interview not started")]
    NotStarted,

    /// Recording requested after the last question was answered
    #[error("Interview already complete")]
    InterviewComplete,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Audio, transcription or generation backend missing
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Network or API failure talking to an external service
    #[error("Service call failed: {0}")]
    TransientServiceFailure(String),
}

impl CoachError {
    /// True when the request was well-formed but the session is in the wrong state for it
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            CoachError::AlreadyActive
                | CoachError::NotRecording
                | CoachError::NotStarted
                | CoachError::InterviewComplete
        )
    }
}
