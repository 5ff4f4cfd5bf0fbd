pub mod client;
pub mod messages;

pub use client::OpenAiClient;
pub use messages::{ChatMessage, ChatRequest, ChatResponse, SpeechRequest, TranscriptionResponse};
