//! Terminal practice loop: the same coach as the HTTP server, driven from stdin.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::coach::{InterviewCoach, StartInterview};
use crate::recording::{closing_remark, TurnOutcome};
use crate::session::SessionSnapshot;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run one interview to completion
pub async fn run(coach: &InterviewCoach, request: StartInterview) -> Result<()> {
    let started = coach.start_interview(request).await?;

    println!("\n=== Mock interview: {} ===\n", started.job);
    if let Some(welcome) = started.questions.first() {
        println!("{}\n", welcome);
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut turns = coach.subscribe_turns();

    let mut snapshot = wait_for(coach, |s| s.current_question_index >= 1 || s.is_complete).await;

    while !snapshot.is_complete {
        let index = snapshot.current_question_index;
        let question = snapshot
            .questions
            .get(index as usize)
            .cloned()
            .unwrap_or_default();
        println!("Question {}: {}", index, question);

        let recording = coach.start_recording().await?;
        println!("Recording... press Enter when you have finished answering.");

        let line = stdin.next_line().await.context("Failed to read from stdin")?;
        match coach.stop_recording().await {
            Ok(outcome) => info!("Stop: {:?}", outcome),
            // The capture already timed out and is being processed
            Err(e) => warn!("{}", e),
        }

        let outcome = next_outcome(&mut turns, recording.capture_id).await?;
        println!("\nYour answer: {}", outcome.answer);
        println!("Feedback: {}\n", outcome.feedback);

        if line.is_none() {
            bail!("stdin closed; ending the interview early");
        }

        snapshot = coach.snapshot().await;
    }

    println!("{}", closing_remark(&snapshot.interviewer_name));
    Ok(())
}

async fn next_outcome(turns: &mut broadcast::Receiver<TurnOutcome>, capture_id: uuid::Uuid) -> Result<TurnOutcome> {
    loop {
        match turns.recv().await {
            Ok(outcome) if outcome.capture_id == capture_id => return Ok(outcome),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Missed {} turn outcomes", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => bail!("Turn sequencer stopped"),
        }
    }
}

async fn wait_for(coach: &InterviewCoach, ready: impl Fn(&SessionSnapshot) -> bool) -> SessionSnapshot {
    loop {
        let snapshot = coach.snapshot().await;
        if ready(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
