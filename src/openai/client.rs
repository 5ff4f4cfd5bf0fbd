use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{ApiErrorResponse, ChatRequest, ChatResponse, SpeechRequest, TranscriptionResponse};
use crate::config::OpenAiConfig;

/// Minimal client for the three OpenAI endpoints the coach uses
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    transcription_model: String,
    speech_model: String,
}

/// Basic key format check: `sk-` or `sk-proj-` prefix and a plausible length
pub fn is_valid_api_key(key: &str) -> bool {
    key.starts_with("sk-") && key.len() > 20
}

impl OpenAiClient {
    /// Build a client if a usable API key is configured
    pub fn from_config(cfg: &OpenAiConfig) -> Result<Option<Self>> {
        let Some(api_key) = cfg.resolved_api_key() else {
            info!("No OpenAI API key configured");
            return Ok(None);
        };

        if !is_valid_api_key(&api_key) {
            bail!("OpenAI API key appears to be invalid");
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        info!("OpenAI client ready ({})", cfg.base_url);

        Ok(Some(Self {
            http,
            api_key,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            chat_model: cfg.chat_model.clone(),
            transcription_model: cfg.transcription_model.clone(),
            speech_model: cfg.speech_model.clone(),
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Single-prompt chat completion
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest::user(&self.chat_model, prompt);

        let response = self
            .http
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        let body: ChatResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let text = body
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .context("Chat completion returned no content")?;

        debug!("Chat completion: {} chars", text.len());
        Ok(text.to_string())
    }

    /// Upload a WAV file for transcription
    pub async fn transcribe(&self, audio: &Path) -> Result<String> {
        let bytes = tokio::fs::read(audio)
            .await
            .with_context(|| format!("Failed to read audio file {}", audio.display()))?;

        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "answer.wav".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .context("Invalid audio MIME type")?;

        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", part);

        let response = self
            .http
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?;

        let body: TranscriptionResponse = check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(body.text)
    }

    /// Synthesize `text` and return the encoded MP3 bytes
    pub async fn speech(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: self.speech_model.clone(),
            voice: voice.to_string(),
            input: text.to_string(),
        };

        let response = self
            .http
            .post(self.url("audio/speech"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Speech request failed")?;

        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .context("Failed to read speech audio")?;

        Ok(bytes.to_vec())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    bail!("OpenAI API error ({}): {}", status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_format() {
        assert!(is_valid_api_key("sk-proj-0123456789abcdefghij"));
        assert!(!is_valid_api_key("sk-short"));
        assert!(!is_valid_api_key("pk-0123456789abcdefghijklmn"));
    }

    #[test]
    fn test_missing_key_yields_no_client() -> Result<()> {
        let cfg = OpenAiConfig {
            api_key: Some(String::new()),
            ..OpenAiConfig::default()
        };
        // An empty configured key defers to the environment
        if std::env::var("OPENAI_API_KEY").is_err() {
            assert!(OpenAiClient::from_config(&cfg)?.is_none());
        }
        Ok(())
    }
}
