use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub interview: InterviewConfig,
    pub openai: OpenAiConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "interview-coach".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Directory served for any path not handled by the API (the polling UI)
    pub static_dir: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub recordings_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Hard cap on a single answer recording
    pub max_recording_secs: u64,
    /// `microphone`, `simulated` or `file:<path>`
    pub source: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            recordings_path: "recordings".to_string(),
            sample_rate: 16000,
            channels: 1,
            max_recording_secs: 120,
            source: "microphone".to_string(),
        }
    }
}

impl AudioConfig {
    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.recordings_path).into_owned())
    }

    pub fn max_recording_duration(&self) -> Duration {
        Duration::from_secs(self.max_recording_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub default_questions: usize,
    pub interviewer_name: String,
    pub interviewer_voice: String,
    /// A recording or processing phase older than this is reported as stuck
    pub stuck_after_secs: u64,
    /// Pause between the welcome message and the first question
    pub welcome_pause_ms: u64,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            default_questions: 3,
            interviewer_name: "Kashmala".to_string(),
            interviewer_voice: "shimmer".to_string(),
            stuck_after_secs: 300,
            welcome_pause_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    pub speech_model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            transcription_model: "whisper-1".to_string(),
            speech_model: "tts-1-hd".to_string(),
            timeout_secs: 60,
        }
    }
}

impl OpenAiConfig {
    /// Configured key, or `OPENAI_API_KEY` from the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Command used to play synthesized MP3 files (defaults per platform)
    pub player: Option<String>,
    /// Command used for local system speech
    pub system_command: String,
    /// Pacing of the printed fallback
    pub seconds_per_word: f64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            player: None,
            system_command: "say".to_string(),
            seconds_per_word: 0.2,
        }
    }
}

impl SpeechConfig {
    pub fn player_command(&self) -> String {
        self.player.clone().unwrap_or_else(|| {
            if cfg!(target_os = "macos") {
                "afplay".to_string()
            } else {
                "mpg123".to_string()
            }
        })
    }
}

impl Config {
    /// Load configuration from an optional file, then `COACH_*` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("COACH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_interview_contract() {
        let cfg = Config::default();

        assert_eq!(cfg.audio.max_recording_secs, 120);
        assert_eq!(cfg.audio.max_recording_duration(), Duration::from_secs(120));
        assert_eq!(cfg.interview.default_questions, 3);
        assert_eq!(cfg.interview.interviewer_voice, "shimmer");
        assert_eq!(cfg.service.http.port, 8080);
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let cfg = Config::load("/nonexistent/interview-coach")?;

        assert_eq!(cfg.service.name, "interview-coach");
        assert_eq!(cfg.audio.sample_rate, 16000);
        Ok(())
    }
}
