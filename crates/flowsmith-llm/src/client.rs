use crate::types::*;
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub enable_thinking: Option<bool>,
    /// Whole-request timeout; `None` waits as long as the provider takes.
    pub timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: Some(0.7),
            max_tokens: None,
            enable_thinking: None,
            timeout: None,
        }
    }
}

/// Failure talking to the completion provider.
///
/// The generation pipeline treats any error carrying this type as an upstream
/// failure and substitutes the fallback flowchart.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Failed to send request to LLM: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("LLM request failed ({status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Failed to parse LLM response: {0}")]
    InvalidResponse(String),
}

/// Anything that can answer a chat completion request.
pub trait ChatBackend: Send + Sync {
    fn model_name(&self) -> &str;

    fn chat(&self, messages: Vec<Message>) -> impl Future<Output = Result<ChatResponse>> + Send;
}

pub struct LlmClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn send(&self, messages: Vec<Message>) -> Result<ChatResponse, CompletionError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            enable_thinking: self.config.enable_thinking,
        };

        debug!("LLM request to {}: {} messages", url, request.messages.len());

        let mut req_builder = self.http.post(&url).json(&request);

        if let Some(api_key) = &self.config.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder
            .send()
            .await
            .map_err(CompletionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(CompletionError::Transport)?;
        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        info!(
            "LLM response: finish_reason={:?}, total_tokens={:?}",
            chat_response
                .choices
                .first()
                .and_then(|c| c.finish_reason.as_ref()),
            chat_response.usage.as_ref().map(|u| u.total_tokens)
        );

        Ok(chat_response)
    }
}

impl ChatBackend for LlmClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, messages: Vec<Message>) -> Result<ChatResponse> {
        Ok(self.send(messages).await?)
    }
}
