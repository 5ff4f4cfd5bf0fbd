use anyhow::Result;
use std::sync::Arc;

use crate::error::CoachError;
use crate::openai::OpenAiClient;

/// Text generation collaborator: `generate(prompt) -> text`.
///
/// May fail; every caller keeps a deterministic fallback.
#[async_trait::async_trait]
pub trait ContentBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Backend name for logging and status reporting
    fn name(&self) -> &str;
}

/// Chat completions over the OpenAI API
pub struct OpenAiContent {
    client: Arc<OpenAiClient>,
}

impl OpenAiContent {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ContentBackend for OpenAiContent {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client
            .chat(prompt)
            .await
            .map_err(|e| CoachError::TransientServiceFailure(format!("{:#}", e)).into())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Stand-in when no generation service is configured; callers fall back to canned text
pub struct UnavailableContent {
    reason: String,
}

impl UnavailableContent {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait::async_trait]
impl ContentBackend for UnavailableContent {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(CoachError::BackendUnavailable(self.reason.clone()).into())
    }

    fn name(&self) -> &str {
        "canned"
    }
}
