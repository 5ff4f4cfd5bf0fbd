pub mod backend;
pub mod capture;
pub mod file;
pub mod simulated;
pub mod wav;

#[cfg(feature = "microphone")]
pub mod microphone;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use capture::{AudioCaptureSession, CaptureEnd, CaptureRequest, CapturedAudio, MAX_CAPTURE_DURATION};
pub use file::{AudioFile, FileBackend};
pub use simulated::SimulatedBackend;
pub use wav::{answer_path, save_answer, AnswerWriter};
