use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::lessons::parser::ParseError;
use crate::lessons::store::StoreError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("AI output error: {0}")]
    AiOutput(#[from] ParseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Llm(e) => match e {
                LlmError::MissingApiKey => (StatusCode::INTERNAL_SERVER_ERROR, "AI_NOT_CONFIGURED"),
                LlmError::Unauthorized => (StatusCode::BAD_GATEWAY, "AI_AUTH_FAILED"),
                LlmError::QuotaExceeded => (StatusCode::SERVICE_UNAVAILABLE, "AI_QUOTA_EXCEEDED"),
                LlmError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "AI_RATE_LIMITED"),
                LlmError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "AI_TIMEOUT"),
                LlmError::Connection(_) => (StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE"),
                LlmError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "AI_UPSTREAM_ERROR"),
                LlmError::MalformedEnvelope(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "AI_OUTPUT_INVALID")
                }
            },
            AppError::AiOutput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "AI_OUTPUT_INVALID"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Llm(LlmError::Upstream { status, message }) => {
                tracing::error!("LLM provider error {status}: {message}");
                format!("The AI provider returned an error (status {status})")
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                e.to_string()
            }
            AppError::AiOutput(e) => {
                tracing::warn!("Unusable AI output: {e}");
                e.to_string()
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                "A storage error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
