//! Translation provider port and its HTTP backends.
//!
//! The client only sees [`TranslationProvider`]; which backend sits behind it
//! is decided once, at startup, by [`build_provider`].

use crate::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const GOOGLE_DEFAULT_URL: &str = "https://translation.googleapis.com";
pub const LIBRETRANSLATE_DEFAULT_URL: &str = "https://libretranslate.com";

/// Errors a provider call can fail with
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("provider returned an empty result")]
    EmptyResult,

    #[error("{0} requires an API key")]
    MissingApiKey(&'static str),
}

impl ProviderError {
    /// Determine if an error is retryable (5xx errors, 429 rate limit, network errors)
    /// Other 4xx client errors should not be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Network(_)
            | ProviderError::Timeout
            | ProviderError::InvalidResponse(_)
            | ProviderError::EmptyResult => true,
            ProviderError::MissingApiKey(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// An external machine-translation backend.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short backend name used in logs and errors
    fn name(&self) -> &'static str;

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Detect the language of `text`, returning the backend's language code
    async fn detect(&self, text: &str) -> Result<String, ProviderError>;
}

/// Which backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    LibreTranslate,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "libretranslate" | "libre" => Ok(ProviderKind::LibreTranslate),
            other => anyhow::bail!(
                "Unknown translation provider '{}' (expected 'google' or 'libretranslate')",
                other
            ),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Google => f.write_str("google"),
            ProviderKind::LibreTranslate => f.write_str("libretranslate"),
        }
    }
}

/// Build the configured provider.
pub fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn TranslationProvider>> {
    let provider: Arc<dyn TranslationProvider> = match config.provider {
        ProviderKind::Google => {
            let api_key = config
                .api_key
                .clone()
                .ok_or(ProviderError::MissingApiKey("google"))
                .context("TRANSLATION_API_KEY not set")?;
            let base_url = config.api_url.as_deref().unwrap_or(GOOGLE_DEFAULT_URL);
            Arc::new(GoogleProvider::new(api_key, base_url, config.request_timeout)?)
        }
        ProviderKind::LibreTranslate => {
            let base_url = config
                .api_url
                .as_deref()
                .unwrap_or(LIBRETRANSLATE_DEFAULT_URL);
            Arc::new(LibreTranslateProvider::new(
                config.api_key.clone(),
                base_url,
                config.request_timeout,
            )?)
        }
    };

    Ok(provider)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// POST a JSON body and decode a JSON response, mapping non-2xx to `ProviderError::Api`.
async fn post_json<B, R>(
    request: reqwest::RequestBuilder,
    provider: &'static str,
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request.json(body).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        return Err(ProviderError::Api {
            provider,
            status,
            body,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

// ==================== Google Cloud Translation (v2) ====================

#[derive(Debug, Serialize)]
struct GoogleTranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Serialize)]
struct GoogleDetectRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoogleEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct GoogleTranslations {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
struct GoogleDetection {
    language: String,
}

#[derive(Debug, Deserialize)]
struct GoogleDetections {
    detections: Vec<Vec<GoogleDetection>>,
}

/// Google Cloud Translation v2, authenticated with an API key.
pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .query(&[("key", self.api_key.as_str())])
    }
}

#[async_trait]
impl TranslationProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = GoogleTranslateRequest {
            q: text,
            source: source_language,
            target: target_language,
            format: "text",
        };

        let response: GoogleEnvelope<GoogleTranslations> =
            post_json(self.endpoint("/language/translate/v2"), self.name(), &request).await?;

        response
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or(ProviderError::EmptyResult)
    }

    async fn detect(&self, text: &str) -> Result<String, ProviderError> {
        let response: GoogleEnvelope<GoogleDetections> = post_json(
            self.endpoint("/language/translate/v2/detect"),
            self.name(),
            &GoogleDetectRequest { q: text },
        )
        .await?;

        response
            .data
            .detections
            .into_iter()
            .next()
            .and_then(|candidates| candidates.into_iter().next())
            .map(|d| d.language)
            .ok_or(ProviderError::EmptyResult)
    }
}

// ==================== LibreTranslate ====================

#[derive(Debug, Serialize)]
struct LibreTranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LibreDetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreTranslateResponse {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct LibreDetection {
    language: String,
}

/// A LibreTranslate server, public or self-hosted. The API key is optional.
pub struct LibreTranslateProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslateProvider {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateProvider {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        let request = LibreTranslateRequest {
            q: text,
            source: source_language,
            target: target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response: LibreTranslateResponse = post_json(
            self.client.post(format!("{}/translate", self.base_url)),
            self.name(),
            &request,
        )
        .await?;

        Ok(response.translated_text)
    }

    async fn detect(&self, text: &str) -> Result<String, ProviderError> {
        let request = LibreDetectRequest {
            q: text,
            api_key: self.api_key.as_deref(),
        };

        // Candidates arrive sorted by confidence, best first
        let response: Vec<LibreDetection> = post_json(
            self.client.post(format!("{}/detect", self.base_url)),
            self.name(),
            &request,
        )
        .await?;

        response
            .into_iter()
            .next()
            .map(|d| d.language)
            .ok_or(ProviderError::EmptyResult)
    }
}
