use super::config::SessionConfig;
use super::snapshot::{SessionSnapshot, TurnRecord};
use crate::error::CoachError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// `questions[0]` is the welcome message; real questions start here.
///
/// Turn `n` (zero-based, the n-th entry of `answers`/`feedbacks`) answers
/// `questions[n + WELCOME_OFFSET]`.
pub const WELCOME_OFFSET: usize = 1;

/// The one interview session owned by the process
pub type SharedSession = Arc<Mutex<InterviewSession>>;

/// Where the current turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Waiting for the candidate to start recording (or for the welcome to finish)
    Idle,
    /// A capture is running
    Recording,
    /// The captured answer is being transcribed and evaluated
    Processing,
    /// Every question has been answered
    Complete,
}

/// What happens after a turn has been recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAdvance {
    Next { question_index: usize, question: String },
    Complete { interviewer_name: String },
}

/// State of a single mock interview.
///
/// All transitions are check-and-set methods meant to be called with the
/// session lock held; none of them block.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    id: Uuid,
    config: SessionConfig,
    questions: Vec<String>,
    answers: Vec<String>,
    feedbacks: Vec<String>,
    current_question_index: i64,
    phase: TurnPhase,
    active_capture: Option<Uuid>,
    phase_started_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            config: SessionConfig::default(),
            questions: Vec::new(),
            answers: Vec::new(),
            feedbacks: Vec::new(),
            current_question_index: -1,
            phase: TurnPhase::Idle,
            active_capture: None,
            phase_started_at: None,
            started_at: None,
        }
    }
}

impl InterviewSession {
    /// Fresh session; the welcome message becomes `questions[0]`
    pub fn new(config: SessionConfig, welcome: String, questions: Vec<String>) -> Self {
        let mut all = Vec::with_capacity(questions.len() + WELCOME_OFFSET);
        all.push(welcome);
        all.extend(questions);

        Self {
            id: Uuid::new_v4(),
            config,
            questions: all,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn feedbacks(&self) -> &[String] {
        &self.feedbacks
    }

    pub fn current_question_index(&self) -> i64 {
        self.current_question_index
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn active_capture(&self) -> Option<Uuid> {
        self.active_capture
    }

    pub fn is_recording(&self) -> bool {
        self.phase == TurnPhase::Recording
    }

    pub fn is_processing(&self) -> bool {
        self.phase == TurnPhase::Processing
    }

    pub fn is_complete(&self) -> bool {
        self.phase == TurnPhase::Complete
    }

    /// True once the first real question has been asked
    pub fn is_started(&self) -> bool {
        self.current_question_index >= WELCOME_OFFSET as i64
    }

    pub fn welcome_message(&self) -> Option<&str> {
        self.questions.first().map(String::as_str)
    }

    pub fn current_question(&self) -> Option<&str> {
        if !self.is_started() {
            return None;
        }
        self.questions
            .get(self.current_question_index as usize)
            .map(String::as_str)
    }

    /// Completed turns, each paired with the question it answered
    pub fn turns(&self) -> Vec<TurnRecord> {
        self.answers
            .iter()
            .zip(&self.feedbacks)
            .enumerate()
            .map(|(turn, (answer, feedback))| {
                let question_index = turn + WELCOME_OFFSET;
                TurnRecord {
                    question_index,
                    question: self.questions.get(question_index).cloned().unwrap_or_default(),
                    answer: answer.clone(),
                    feedback: feedback.clone(),
                }
            })
            .collect()
    }

    /// Move past the welcome message. Returns the first question to ask.
    ///
    /// Does nothing if `session_id` belongs to a replaced session or the
    /// first question was already opened.
    pub fn open_first_question(&mut self, session_id: Uuid) -> Option<String> {
        if self.id != session_id || self.current_question_index >= 0 {
            return None;
        }

        self.current_question_index = WELCOME_OFFSET as i64;
        match self.questions.get(WELCOME_OFFSET) {
            Some(question) => Some(question.clone()),
            None => {
                self.phase = TurnPhase::Complete;
                None
            }
        }
    }

    /// Claim the session for a new capture
    pub fn begin_recording(&mut self, capture_id: Uuid) -> Result<usize, CoachError> {
        match self.phase {
            TurnPhase::Recording | TurnPhase::Processing => return Err(CoachError::AlreadyActive),
            TurnPhase::Complete => return Err(CoachError::InterviewComplete),
            TurnPhase::Idle => {}
        }

        if !self.is_started() {
            return Err(CoachError::NotStarted);
        }

        self.phase = TurnPhase::Recording;
        self.active_capture = Some(capture_id);
        self.phase_started_at = Some(Utc::now());

        Ok(self.current_question_index as usize)
    }

    /// The capture a stop request should target
    pub fn recording_capture(&self) -> Result<Uuid, CoachError> {
        match (self.phase, self.active_capture) {
            (TurnPhase::Recording, Some(id)) => Ok(id),
            _ => Err(CoachError::NotRecording),
        }
    }

    /// Recording -> Processing for the capture that just finished.
    ///
    /// Returns the question index and text, or `None` if the capture is
    /// stale (session replaced or reset since it started).
    pub fn begin_processing(&mut self, capture_id: Uuid) -> Option<(usize, String)> {
        if self.phase != TurnPhase::Recording || self.active_capture != Some(capture_id) {
            return None;
        }

        let index = self.current_question_index as usize;
        let question = self.questions.get(index)?.clone();

        self.phase = TurnPhase::Processing;
        self.phase_started_at = Some(Utc::now());

        Some((index, question))
    }

    /// Record the answer and feedback together and advance to the next question
    pub fn complete_turn(&mut self, capture_id: Uuid, answer: String, feedback: String) -> Option<TurnAdvance> {
        if self.phase != TurnPhase::Processing || self.active_capture != Some(capture_id) {
            return None;
        }

        self.answers.push(answer);
        self.feedbacks.push(feedback);
        self.current_question_index += 1;
        self.active_capture = None;
        self.phase_started_at = None;

        let next = self.current_question_index as usize;
        if next < self.questions.len() {
            self.phase = TurnPhase::Idle;
            Some(TurnAdvance::Next {
                question_index: next,
                question: self.questions[next].clone(),
            })
        } else {
            self.phase = TurnPhase::Complete;
            Some(TurnAdvance::Complete {
                interviewer_name: self.config.interviewer_name.clone(),
            })
        }
    }

    /// Leave Processing for `capture_id` if a turn exited without completing
    pub fn finish_processing(&mut self, capture_id: Uuid) -> bool {
        if self.phase != TurnPhase::Processing || self.active_capture != Some(capture_id) {
            return false;
        }

        self.phase = TurnPhase::Idle;
        self.active_capture = None;
        self.phase_started_at = None;
        true
    }

    /// Force the recording and processing flags off. Safe at any time.
    ///
    /// Returns the capture that was in flight, if any. Completion of that
    /// capture is ignored from now on.
    pub fn reset_flags(&mut self) -> Option<Uuid> {
        if matches!(self.phase, TurnPhase::Recording | TurnPhase::Processing) {
            self.phase = TurnPhase::Idle;
        }
        self.phase_started_at = None;
        self.active_capture.take()
    }

    /// A recording or processing phase that has outlived `threshold`
    pub fn is_stuck(&self, threshold: Duration) -> bool {
        if !matches!(self.phase, TurnPhase::Recording | TurnPhase::Processing) {
            return false;
        }

        match (self.phase_started_at, chrono::Duration::from_std(threshold)) {
            (Some(since), Ok(threshold)) => Utc::now().signed_duration_since(since) > threshold,
            _ => false,
        }
    }

    pub fn snapshot(&self, stuck_after: Duration) -> SessionSnapshot {
        SessionSnapshot {
            session_id: (!self.id.is_nil()).then_some(self.id),
            job: self.config.job.clone(),
            current_question_index: self.current_question_index,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            feedbacks: self.feedbacks.clone(),
            turns: self.turns(),
            phase: self.phase,
            is_recording: self.is_recording(),
            is_processing: self.is_processing(),
            is_complete: self.is_complete(),
            stuck: self.is_stuck(stuck_after),
            phase_started_at: self.phase_started_at,
            started_at: self.started_at,
            interviewer_name: self.config.interviewer_name.clone(),
            interviewer_voice: self.config.interviewer_voice.clone(),
        }
    }
}
