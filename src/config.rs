use crate::i18n::LanguageCatalog;
use crate::provider::ProviderKind;
use crate::retry::RetryConfig;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Pipeline
    pub default_language: String,

    // Translation provider
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub request_timeout: Duration,

    // Cache / retry
    pub cache_ttl: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,

    // Server
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_language = std::env::var("PIPELINE_DEFAULT_LANGUAGE")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_else(|_| "en".to_string());
        if !LanguageCatalog::new().is_supported(&default_language) {
            anyhow::bail!(
                "PIPELINE_DEFAULT_LANGUAGE '{}' is not a supported language",
                default_language
            );
        }

        let provider = std::env::var("TRANSLATION_PROVIDER")
            .unwrap_or_else(|_| "google".to_string())
            .parse::<ProviderKind>()
            .context("Invalid TRANSLATION_PROVIDER")?;

        Ok(Self {
            default_language,

            provider,
            api_key: non_empty_var("TRANSLATION_API_KEY"),
            api_url: non_empty_var("TRANSLATION_API_URL"),
            request_timeout: Duration::from_secs(parse_var("TRANSLATION_TIMEOUT_SECS", 10)),

            cache_ttl: Duration::from_secs(parse_var("TRANSLATION_CACHE_TTL_SECS", 3600)),
            // Total attempts; zero would mean "never call the provider"
            max_retries: parse_var("TRANSLATION_MAX_RETRIES", 3u32).max(1),
            retry_delay: Duration::from_millis(parse_var("TRANSLATION_RETRY_DELAY_MS", 1000)),

            port: parse_var("PORT", 8080),
        })
    }

    /// Retry policy for provider calls
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, self.retry_delay)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            provider: ProviderKind::Google,
            api_key: None,
            api_url: None,
            request_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(3600),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            port: 8080,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
