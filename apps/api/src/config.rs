use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "google/gemini-1.5-flash-latest";
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 90;
const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Application configuration loaded from environment variables.
///
/// Nothing here is mandatory: a missing API key surfaces on the first LLM call,
/// and a missing `DATABASE_URL` selects the no-op store.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub openrouter_api_url: String,
    pub llm_timeout: Duration,
    pub app_url: String,
    pub database_url: Option<String>,
    pub allowed_origins: Vec<String>,
    /// Cap on kept vocabulary entries per lesson. `None` keeps everything valid.
    pub vocabulary_limit: Option<usize>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_timeout_secs = match get("LLM_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let vocabulary_limit = get("VOCABULARY_LIMIT")
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .context("VOCABULARY_LIMIT must be a non-negative integer")
            })
            .transpose()?;

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Config {
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_model: get("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openrouter_api_url: get("OPENROUTER_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            app_url: get("APP_URL").unwrap_or_else(|| "http://localhost:8000".to_string()),
            database_url: get("DATABASE_URL"),
            allowed_origins,
            vocabulary_limit,
            port: get("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
