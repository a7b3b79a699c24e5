use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,
    pub openai_temperature: f32,

    // Database
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Translation fan-out
    pub translation_concurrency: usize,
    pub provider_timeout_secs: u64,
    pub permit_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            // OpenAI
            openai_api_key: std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            openai_temperature: std::env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.6),

            // Database
            database_url: std::env::var("DATABASE_URL").ok(),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            // Translation fan-out
            translation_concurrency: std::env::var("TRANSLATION_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            provider_timeout_secs: std::env::var("TRANSLATION_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            permit_timeout_secs: std::env::var("TRANSLATION_PERMIT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.translation_concurrency == 0 {
            bail!("TRANSLATION_CONCURRENCY must be at least 1");
        }
        if self.openai_api_key.trim().is_empty() {
            bail!("OPENAI_API_KEY is empty");
        }
        Ok(())
    }

    /// The database URL, for binaries that need one.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().context("DATABASE_URL not set")
    }

    /// Provider call timeout; `None` when disabled with 0.
    pub fn provider_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.provider_timeout_secs)
    }

    /// Permit wait timeout; `None` when disabled with 0.
    pub fn permit_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.permit_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
