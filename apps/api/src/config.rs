use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which chat-completion backend the LLM relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    OpenRouter,
    HuggingFace,
}

impl ProviderKind {
    /// Model used when `LLM_MODEL` is not set.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4",
            ProviderKind::OpenRouter => "openai/gpt-3.5-turbo",
            ProviderKind::HuggingFace => "google/flan-t5-large",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::HuggingFace => "https://api-inference.huggingface.co",
        }
    }

    fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::HuggingFace => "HF_API_KEY",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            other => bail!("Unknown LLM_PROVIDER '{other}' (expected openai, openrouter or huggingface)"),
        }
    }
}

/// LLM relay settings. The API key never leaves the server.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub openrouter_referer: String,
    pub openrouter_title: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if the API key for the selected provider is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub redis_url: Option<String>,
    pub auth_delay_ms: u64,
    pub allow_plain_text: bool,
    pub max_upload_bytes: usize,
    /// A session expires after this long unused.
    pub session_idle_secs: u64,
    /// A session expires this long after login, used or not.
    pub session_max_age_secs: u64,
    pub session_sweep_secs: u64,
    pub cors_origin: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider: ProviderKind = optional_env("LLM_PROVIDER")
            .unwrap_or_else(|| "openai".to_string())
            .parse()?;

        let llm = LlmConfig {
            provider,
            api_key: require_env(provider.api_key_var())?,
            model: optional_env("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: optional_env("LLM_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            max_retries: parse_env("LLM_MAX_RETRIES", 0)?,
            timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            openrouter_referer: optional_env("OPENROUTER_REFERER")
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            openrouter_title: optional_env("OPENROUTER_TITLE")
                .unwrap_or_else(|| "JobLens Agent".to_string()),
        };

        Ok(Config {
            llm,
            redis_url: optional_env("REDIS_URL"),
            auth_delay_ms: parse_env("AUTH_DELAY_MS", 1500)?,
            allow_plain_text: parse_env("ALLOW_PLAIN_TEXT", false)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            session_idle_secs: parse_env("SESSION_IDLE_SECS", 2 * 60 * 60)?,
            session_max_age_secs: parse_env("SESSION_MAX_AGE_SECS", 24 * 60 * 60)?,
            session_sweep_secs: parse_env("SESSION_SWEEP_SECS", 60)?,
            cors_origin: optional_env("CORS_ORIGIN"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and empty are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
