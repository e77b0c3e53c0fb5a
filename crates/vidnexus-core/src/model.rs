//! Summarization model abstraction and the HTTP chat-completions client.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    error::Result,
    prompts::{SUMMARIZER_INSTRUCTIONS, system_prompt},
    provider::Provider,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid API response: {reason}")]
    MalformedResponse { reason: String },

    #[error("{0}")]
    Other(String),
}

impl ModelError {
    /// Failures that may go away if the same call is repeated.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Transport(_) | ModelError::Other(_) => true,
            ModelError::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            ModelError::MalformedResponse { .. } => false,
        }
    }
}

/// Raw value returned by a model call, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Text(String),
    Structured(Value),
}

impl ModelOutput {
    /// Normalizes to trimmed plain text.
    pub fn into_text(self) -> String {
        match self {
            ModelOutput::Text(text) => text.trim().to_string(),
            ModelOutput::Structured(Value::String(text)) => text.trim().to_string(),
            ModelOutput::Structured(value) => match value.get("content").and_then(Value::as_str) {
                Some(content) => content.trim().to_string(),
                None => value.to_string().trim().to_string(),
            },
        }
    }
}

impl From<String> for ModelOutput {
    fn from(text: String) -> Self {
        ModelOutput::Text(text)
    }
}

impl From<&str> for ModelOutput {
    fn from(text: &str) -> Self {
        ModelOutput::Text(text.to_string())
    }
}

/// Text-in, text-out generation capability.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<ModelOutput, ModelError>;
}

#[async_trait]
impl<M: SummaryModel + ?Sized> SummaryModel for Arc<M> {
    async fn generate(&self, prompt: &str) -> std::result::Result<ModelOutput, ModelError> {
        (**self).generate(prompt).await
    }
}

#[async_trait]
impl<'a, M: SummaryModel + ?Sized> SummaryModel for &'a M {
    async fn generate(&self, prompt: &str) -> std::result::Result<ModelOutput, ModelError> {
        (**self).generate(prompt).await
    }
}

/// Immutable model configuration, built once per process and shared.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub provider: Provider,
    pub api_url: String,
    pub model: String,
    pub instructions: String,
    pub temperature: f32,
    pub markdown: bool,
    pub request_timeout: Duration,
}

impl AgentConfig {
    pub fn for_provider(provider: Provider) -> Self {
        let config = provider.config();
        Self {
            provider,
            api_url: config.api_url.to_string(),
            model: config.model.to_string(),
            instructions: SUMMARIZER_INSTRUCTIONS.to_string(),
            temperature: 0.3,
            markdown: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn system_prompt(&self) -> String {
        system_prompt(&self.instructions, self.markdown)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::for_provider(Provider::default())
    }
}

/// OpenAI-compatible chat completions client.
pub struct ChatModel {
    client: reqwest::Client,
    config: Arc<AgentConfig>,
    api_key: String,
}

impl ChatModel {
    /// Reads the provider's API key from the environment.
    pub fn new(config: Arc<AgentConfig>) -> Result<Self> {
        let api_key = config.provider.validate_api_key()?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: Arc<AgentConfig>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Pulls `choices[0].message.content` out of a chat completions response.
pub(crate) fn extract_content(response: &Value) -> std::result::Result<String, ModelError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ModelError::MalformedResponse {
            reason: format!("{:?}", response),
        })
}

#[async_trait]
impl SummaryModel for ChatModel {
    async fn generate(&self, prompt: &str) -> std::result::Result<ModelOutput, ModelError> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "calling model");

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.config.model,
                "messages": [
                    {
                        "role": "system",
                        "content": self.config.system_prompt(),
                    },
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": self.config.temperature,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response = response.json::<Value>().await?;
        extract_content(&response).map(ModelOutput::Text)
    }
}
