/// LLM Gateway: the single point of entry for chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module talks to the LLM provider directly.
/// Each call is exactly one HTTP attempt. Failures come back as distinct
/// `LlmError` variants and retry policy belongs to the caller.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_API_URL, DEFAULT_MODEL};

pub mod prompts;

/// Application name reported to the provider for attribution.
const APP_TITLE: &str = "EasyLesson";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("LLM provider rejected the API key")]
    Unauthorized,

    #[error("LLM provider quota exhausted or payment required")]
    QuotaExceeded,

    #[error("LLM provider rate limit exceeded")]
    RateLimited,

    #[error("LLM request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Could not reach the LLM provider: {0}")]
    Connection(String),

    /// Any other non-success status. `message` is the provider's error text,
    /// kept for logs only.
    #[error("LLM provider returned status {status}")]
    Upstream { status: u16, message: String },

    #[error("Malformed LLM response envelope: {0}")]
    MalformedEnvelope(String),
}

/// Anything that can turn a (system, user) prompt pair into raw model text.
///
/// `LlmClient` is the production implementation; the content service only
/// sees this trait so it can be driven by scripted gateways in tests.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Sends both prompts and returns the message content verbatim.
    /// `model` and `timeout` override the configured defaults when set.
    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// OpenRouter-compatible chat-completions client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    referer: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: api_url.into(),
            model: DEFAULT_MODEL.to_string(),
            referer: "http://localhost:8000".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openrouter_api_key.clone(),
            config.openrouter_api_url.clone(),
        )
        .with_model(config.openrouter_model.clone())
        .with_timeout(config.llm_timeout)
        .with_referer(config.app_url.clone())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
        model: Option<&'a str>,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: model.unwrap_or(&self.model),
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }

    /// Maps a non-success status to its error kind.
    fn classify_status(status: StatusCode, body: String) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED => LlmError::Unauthorized,
            StatusCode::PAYMENT_REQUIRED => LlmError::QuotaExceeded,
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
            _ => {
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                LlmError::Upstream {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    /// Pulls `choices[0].message.content` out of the provider envelope.
    fn extract_content(response: ChatResponse) -> Result<String, LlmError> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| LlmError::MalformedEnvelope("missing message content".to_string()))?;

        match content {
            Value::String(text) => Ok(text),
            Value::Null => Err(LlmError::MalformedEnvelope(
                "message content is null".to_string(),
            )),
            other => {
                warn!("LLM message content is not a string; re-encoding it as JSON text");
                Ok(other.to_string())
            }
        }
    }

    fn transport_error(err: reqwest::Error, timeout: Duration) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(timeout)
        } else {
            LlmError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl LlmGateway for LlmClient {
    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let timeout = timeout.unwrap_or(self.timeout);
        let body = self.build_request(system_prompt, user_prompt, model);

        info!("Sending chat completion request (model: {})", body.model);

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", APP_TITLE)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Self::transport_error(e, timeout))?;

        if !status.is_success() {
            warn!("LLM provider returned {status}");
            debug!("LLM provider error body: {text}");
            return Err(Self::classify_status(status, text));
        }

        let envelope: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            debug!("Undecodable LLM envelope: {text}");
            LlmError::MalformedEnvelope(e.to_string())
        })?;

        let content = Self::extract_content(envelope)?;
        info!(
            "Received chat completion ({} chars, model: {})",
            content.len(),
            body.model
        );
        Ok(content)
    }
}

/// Unkeyed client against the public endpoint. Every call fails with
/// `MissingApiKey` until a key is supplied.
impl Default for LlmClient {
    fn default() -> Self {
        Self::new(None, DEFAULT_API_URL)
    }
}
