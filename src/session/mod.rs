//! Interview session state
//!
//! This module provides the `InterviewSession` data holder that tracks:
//! - The job, interviewer settings and generated questions
//! - Answers and feedback for completed turns
//! - The current turn phase (idle, recording, processing, complete)
//! - Serializable snapshots for state polling

mod config;
mod session;
mod snapshot;

pub use config::SessionConfig;
pub use session::{InterviewSession, SharedSession, TurnAdvance, TurnPhase, WELCOME_OFFSET};
pub use snapshot::{SessionSnapshot, TurnRecord};
