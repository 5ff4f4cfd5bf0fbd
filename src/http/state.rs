use crate::coach::InterviewCoach;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The process-wide interview coach
    pub coach: Arc<InterviewCoach>,
}

impl AppState {
    pub fn new(coach: Arc<InterviewCoach>) -> Self {
        Self { coach }
    }
}
