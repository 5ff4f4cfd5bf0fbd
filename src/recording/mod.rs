//! Recording control and turn sequencing
//!
//! `RecordingController` owns the single capture slot and the
//! start/stop/reset operations. Finished captures flow over a channel to
//! `TurnSequencer`, which turns each one into an answer, feedback and the
//! next question.

mod controller;
mod sequencer;

pub use controller::{CaptureSettings, RecordingController, RecordingStarted, StopOutcome};
pub use sequencer::{closing_remark, TurnOutcome, TurnSequencer};
