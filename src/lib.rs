pub mod audio;
pub mod coach;
pub mod config;
pub mod error;
pub mod http;
pub mod openai;
pub mod practice;
pub mod recording;
pub mod services;
pub mod session;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioCaptureSession, AudioFile, AudioFrame, AudioSource,
    CaptureEnd, CaptureRequest, CapturedAudio,
};
pub use coach::{Backends, BackendStatus, InterviewCoach, InterviewStarted, StartInterview};
pub use config::Config;
pub use error::CoachError;
pub use http::{create_router, AppState};
pub use recording::{RecordingController, RecordingStarted, StopOutcome, TurnOutcome, TurnSequencer};
pub use session::{InterviewSession, SessionConfig, SessionSnapshot, TurnPhase};
