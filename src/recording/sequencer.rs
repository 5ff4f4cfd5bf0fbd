//! Turn processing.
//!
//! Every finished capture arrives here over the completion channel. A turn moves the session from `Recording` to
//! `Processing`, transcribes and evaluates the answer outside the lock,
//! records both results in one step and queues the spoken follow-up. The
//! session never stays in `Processing` after the turn returns, whatever
//! happened along the way.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::CapturedAudio;
use crate::services::{transcribe_or_placeholder, Evaluator, Speaker, TranscriptionBackend};
use crate::session::{SharedSession, TurnAdvance};

pub fn closing_remark(interviewer_name: &str) -> String {
    format!(
        "That completes our interview session. Thank you for practicing with me today! This is {}, wishing you the best of luck with your job search.",
        interviewer_name
    )
}

/// Result of one processed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub capture_id: Uuid,
    pub question_index: usize,
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub transcription_failed: bool,
    pub canned_feedback: bool,
    pub advance: TurnAdvance,
}

pub struct TurnSequencer {
    session: SharedSession,
    transcription: Arc<dyn TranscriptionBackend>,
    evaluator: Arc<Evaluator>,
    speaker: Speaker,
    outcomes: broadcast::Sender<TurnOutcome>,
}

impl TurnSequencer {
    pub fn new(
        session: SharedSession,
        transcription: Arc<dyn TranscriptionBackend>,
        evaluator: Arc<Evaluator>,
        speaker: Speaker,
    ) -> Self {
        let (outcomes, _) = broadcast::channel(16);
        Self {
            session,
            transcription,
            evaluator,
            speaker,
            outcomes,
        }
    }

    /// Receive outcomes of turns processed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TurnOutcome> {
        self.outcomes.subscribe()
    }

    /// Process completions until every sender is gone.
    ///
    /// Each turn runs on its own task so an abandoned turn never delays the
    /// next capture; capture ids keep a stale turn from touching the session.
    pub fn spawn(self: Arc<Self>, mut completions: mpsc::Receiver<CapturedAudio>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(captured) = completions.recv().await {
                let sequencer = Arc::clone(&self);
                tokio::spawn(async move {
                    sequencer.handle_completion(captured).await;
                });
            }
            debug!("Completion channel closed; turn sequencer exiting");
        })
    }

    /// Process one finished capture. Returns `None` for stale captures and failed turns.
    pub async fn handle_completion(&self, captured: CapturedAudio) -> Option<TurnOutcome> {
        let capture_id = captured.capture_id;

        let (question_index, question, voice) = {
            let mut session = self.session.lock().await;
            let voice = session.config().interviewer_voice.clone();
            match session.begin_processing(capture_id) {
                Some((index, question)) => (index, question, voice),
                None => {
                    warn!(
                        "Ignoring stale capture {} for question {} (session reset or replaced)",
                        capture_id, captured.question_index
                    );
                    return None;
                }
            }
        };

        info!(
            "Processing answer to question {} ({:.1}s of audio, {:?})",
            question_index,
            captured.duration_seconds(),
            captured.end
        );

        let outcome = match AssertUnwindSafe(self.run_turn(&captured, question_index, question))
            .catch_unwind()
            .await
        {
            Ok(Some(outcome)) => {
                self.announce(&outcome, &voice);
                Some(outcome)
            }
            Ok(None) => None,
            Err(_) => {
                error!("Turn for question {} panicked; session returned to idle", question_index);
                None
            }
        };

        if self.session.lock().await.finish_processing(capture_id) {
            warn!("Turn for question {} ended without recording an answer", question_index);
        }

        if let Some(outcome) = &outcome {
            let _ = self.outcomes.send(outcome.clone());
        }
        outcome
    }

    async fn run_turn(&self, captured: &CapturedAudio, question_index: usize, question: String) -> Option<TurnOutcome> {
        let (answer, transcription_failed) = transcribe_or_placeholder(self.transcription.as_ref(), &captured.path).await;
        info!("Transcribed answer: {}", answer);

        let evaluation = self.evaluator.evaluate(&question, &answer).await;
        info!("Feedback: {}", evaluation.feedback);

        let advance = self.session.lock().await.complete_turn(
            captured.capture_id,
            answer.clone(),
            evaluation.feedback.clone(),
        );

        let Some(advance) = advance else {
            warn!("Session changed while processing capture {}; discarding turn", captured.capture_id);
            return None;
        };

        Some(TurnOutcome {
            capture_id: captured.capture_id,
            question_index,
            question,
            answer,
            feedback: evaluation.feedback,
            transcription_failed,
            canned_feedback: evaluation.used_fallback,
            advance,
        })
    }

    /// Queue feedback and whatever comes next; never waits for playback
    fn announce(&self, outcome: &TurnOutcome, voice: &str) {
        self.speaker.say(outcome.feedback.clone(), voice);

        match &outcome.advance {
            TurnAdvance::Next { question_index, question } => {
                info!("Next question ({}): {}", question_index, question);
                self.speaker.say(question.clone(), voice);
            }
            TurnAdvance::Complete { interviewer_name } => {
                info!("Interview complete");
                self.speaker.say(closing_remark(interviewer_name), voice);
            }
        }
    }
}
