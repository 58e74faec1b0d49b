//! Translation client: term preservation, caching, retry and graceful fallback.
//!
//! Nothing here returns an error to the caller. A failed translation hands back
//! the source text with `success: false`; a failed detection answers with the
//! default language.

use crate::cache::{CacheKey, TranslationCache};
use crate::config::Config;
use crate::i18n::{
    LanguageCatalog, LanguageEntry, MetricsReport, Substitution, TermDictionary,
    TranslationMetrics, TranslationValidator,
};
use crate::provider::{ProviderError, TranslationProvider};
use crate::retry::{with_retry_if, RetryConfig};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Caller-supplied tag that selects term-preservation behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TranslationContext {
    #[default]
    General,
    /// Medical terms are shielded from the provider with placeholders
    Medical,
    Custom(String),
}

impl TranslationContext {
    /// Parse a context tag (case-insensitive; missing or blank means general).
    pub fn parse(tag: Option<&str>) -> Self {
        let tag = tag.map(|t| t.trim().to_lowercase()).unwrap_or_default();
        match tag.as_str() {
            "" | "general" => TranslationContext::General,
            "medical" => TranslationContext::Medical,
            _ => TranslationContext::Custom(tag),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TranslationContext::General => "general",
            TranslationContext::Medical => "medical",
            TranslationContext::Custom(tag) => tag,
        }
    }

    fn preserves_terms(&self) -> bool {
        matches!(self, TranslationContext::Medical)
    }
}

impl fmt::Display for TranslationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single translation. `translated_text` is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub success: bool,
    pub translated_text: String,
    pub original_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslationResult {
    fn translated(original: &str, translated: String) -> Self {
        Self {
            success: true,
            translated_text: translated,
            original_text: original.to_string(),
            error: None,
        }
    }

    fn unchanged(text: &str) -> Self {
        Self::translated(text, text.to_string())
    }

    fn fallback(text: &str, error: String) -> Self {
        Self {
            success: false,
            translated_text: text.to_string(),
            original_text: text.to_string(),
            error: Some(error),
        }
    }
}

/// Target language(s) for a batch: one code for everything, or one per item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BatchTarget {
    Single(String),
    PerItem(Vec<String>),
}

impl BatchTarget {
    /// Target for item `index`; a short per-item list is padded with `default`.
    pub fn for_index<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        match self {
            BatchTarget::Single(code) => code,
            BatchTarget::PerItem(codes) => codes.get(index).map(String::as_str).unwrap_or(default),
        }
    }
}

impl From<&str> for BatchTarget {
    fn from(code: &str) -> Self {
        BatchTarget::Single(code.to_string())
    }
}

/// Orchestrates translation requests against a [`TranslationProvider`].
pub struct TranslationClient {
    provider: Arc<dyn TranslationProvider>,
    cache: Arc<TranslationCache>,
    catalog: Arc<LanguageCatalog>,
    terms: Arc<TermDictionary>,
    retry: RetryConfig,
    cache_ttl: Duration,
    default_language: String,
    metrics: TranslationMetrics,
}

impl TranslationClient {
    /// Create a client with English as the default language, the provider
    /// retry preset and a one-hour cache TTL.
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        catalog: Arc<LanguageCatalog>,
        terms: Arc<TermDictionary>,
        cache: Arc<TranslationCache>,
    ) -> Self {
        Self {
            provider,
            cache,
            catalog,
            terms,
            retry: RetryConfig::provider_call(),
            cache_ttl: Duration::from_secs(3600),
            default_language: "en".to_string(),
            metrics: TranslationMetrics::new(),
        }
    }

    /// Apply default language, retry policy and TTL from configuration
    pub fn with_config(self, config: &Config) -> Self {
        self.with_default_language(&config.default_language)
            .with_retry(config.retry_config())
            .with_cache_ttl(config.cache_ttl)
    }

    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = language.trim().to_lowercase();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Translate one text. Never fails: errors degrade to the source text.
    pub async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        context: &TranslationContext,
    ) -> TranslationResult {
        let target = target_language.trim().to_lowercase();

        // Identity translation never touches the cache or the network
        if text.trim().is_empty() || target == self.default_language {
            return TranslationResult::unchanged(text);
        }

        if !self.catalog.is_supported(&target) {
            warn!("Unsupported target language '{}', returning source text", target);
            self.metrics.record_fallback();
            return TranslationResult::fallback(
                text,
                format!("Unsupported target language: {}", target),
            );
        }

        // The provider sees the trimmed text; the caller's edge whitespace is
        // reattached so texts sharing a cache key keep their own layout.
        let (leading, core, trailing) = split_edges(text);
        let wrap = |translated: &str| format!("{}{}{}", leading, translated, trailing);

        let key = CacheKey::for_translation(context.as_str(), &target, core);
        if let Some(cached) = self.cache.get(key.as_str()) {
            debug!("Translation cache hit: {}", key);
            self.metrics.record_cache_hit();
            return TranslationResult::translated(text, wrap(&cached));
        }
        debug!("Translation cache miss: {}", key);
        self.metrics.record_cache_miss();

        let outgoing = if context.preserves_terms() {
            self.terms.substitute_placeholders(core)
        } else {
            Substitution {
                text: core.to_string(),
                replacements: Default::default(),
            }
        };

        let provider = &self.provider;
        let sent = outgoing.text.as_str();
        let source = self.default_language.as_str();
        let target_code = target.as_str();

        self.metrics.record_provider_call();
        let response = with_retry_if(
            &self.retry,
            &format!("Translation to {}", target),
            move || async move {
                let raw = provider.translate(sent, source, target_code).await?;
                checked_translation(sent, raw, target_code)
            },
            ProviderError::is_retryable,
        )
        .await;

        match response {
            Ok(raw) => {
                let translated = self
                    .terms
                    .restore_placeholders(&raw, &outgoing.replacements);
                self.cache
                    .set(key.as_str(), translated.clone(), self.cache_ttl);
                TranslationResult::translated(text, wrap(&translated))
            }
            Err(e) => {
                self.metrics.record_provider_failure();
                self.metrics.record_fallback();
                warn!(
                    "Translation to {} failed via {}, returning source text: {}",
                    target,
                    self.provider.name(),
                    e
                );
                TranslationResult::fallback(text, e.to_string())
            }
        }
    }

    /// Translate texts one after another. The output mirrors the input index
    /// for index, whatever happens to individual items.
    pub async fn translate_batch<T: AsRef<str>>(
        &self,
        texts: &[T],
        target: &BatchTarget,
        context: &TranslationContext,
    ) -> Vec<String> {
        let mut translations = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let language = target.for_index(i, &self.default_language);
            let result = self.translate_text(text.as_ref(), language, context).await;
            translations.push(result.translated_text);
        }
        translations
    }

    /// Like [`translate_batch`](Self::translate_batch), with up to
    /// `concurrency` items in flight. Ordering is preserved.
    ///
    /// Two in-flight misses for the same text may both reach the provider;
    /// the later write wins in the cache.
    pub async fn translate_batch_concurrent<T: AsRef<str>>(
        &self,
        texts: &[T],
        target: &BatchTarget,
        context: &TranslationContext,
        concurrency: usize,
    ) -> Vec<String> {
        stream::iter(texts.iter().enumerate())
            .map(|(i, text)| {
                let language = target.for_index(i, &self.default_language);
                async move {
                    self.translate_text(text.as_ref(), language, context)
                        .await
                        .translated_text
                }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Detect the language of `text`. Falls back to the default language.
    pub async fn detect_language(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return self.default_language.clone();
        }

        self.metrics.record_provider_call();
        let detected = with_retry_if(
            &self.retry,
            "Language detection",
            || self.provider.detect(text),
            ProviderError::is_retryable,
        )
        .await;

        match detected {
            Ok(code) => {
                let code = code.trim().to_lowercase();
                if code.is_empty() {
                    self.metrics.record_fallback();
                    warn!("Provider detected no language, using default");
                    return self.default_language.clone();
                }
                code
            }
            Err(e) => {
                self.metrics.record_provider_failure();
                self.metrics.record_fallback();
                warn!("Language detection failed, using default: {}", e);
                self.default_language.clone()
            }
        }
    }

    /// Drop one cache entry, or the whole cache when `key` is None.
    pub fn invalidate_cache(&self, key: Option<&str>) -> usize {
        self.cache.invalidate(key)
    }

    pub fn supported_languages(&self) -> &[LanguageEntry] {
        self.catalog.list_languages()
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.catalog.is_supported(code)
    }

    /// Dictionary translation of a single term.
    pub fn translate_term(&self, term: &str, target_language: &str) -> String {
        self.terms.translate_term(term, target_language)
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }
}

/// Reject a provider response that lost placeholder tokens; number drift is
/// only logged.
fn checked_translation(sent: &str, raw: String, target: &str) -> Result<String, ProviderError> {
    let validation = TranslationValidator::validate(sent, &raw);
    if !validation.warnings.is_empty() {
        warn!(
            "Translation validation warnings for {}: {:?}",
            target, validation.warnings
        );
    }
    if validation.has_errors() {
        warn!(
            "Translation validation errors for {}: {:?}",
            target, validation.errors
        );
        return Err(ProviderError::InvalidResponse(validation.errors.join("; ")));
    }
    Ok(raw)
}

/// Split `text` into leading whitespace, trimmed body and trailing whitespace.
fn split_edges(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    (&text[..start], &text[start..end], &text[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider double: prefixes text with the target code, failing a
    /// configurable number of times first. The first `drop_terms_first`
    /// answers replace `__TERM_0__` with a generic word.
    struct ScriptedProvider {
        translate_calls: AtomicUsize,
        detect_calls: AtomicUsize,
        fail_first: usize,
        drop_terms_first: usize,
        failure_status: u16,
        detected: String,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn ok() -> Self {
            Self {
                translate_calls: AtomicUsize::new(0),
                detect_calls: AtomicUsize::new(0),
                fail_first: 0,
                drop_terms_first: 0,
                failure_status: 500,
                detected: "es".to_string(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing(times: usize, status: u16) -> Self {
            Self {
                fail_first: times,
                failure_status: status,
                ..Self::ok()
            }
        }

        fn dropping_terms(times: usize) -> Self {
            Self {
                drop_terms_first: times,
                ..Self::ok()
            }
        }

        fn always_failing() -> Self {
            Self::failing(usize::MAX, 503)
        }

        fn translate_calls(&self) -> usize {
            self.translate_calls.load(Ordering::SeqCst)
        }

        fn detect_calls(&self) -> usize {
            self.detect_calls.load(Ordering::SeqCst)
        }

        fn error(&self) -> ProviderError {
            ProviderError::Api {
                provider: "scripted",
                status: self.failure_status,
                body: "scripted failure".to_string(),
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn translate(
            &self,
            text: &str,
            _source_language: &str,
            target_language: &str,
        ) -> Result<String, ProviderError> {
            let call = self.translate_calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(text.to_string());
            if call < self.fail_first {
                return Err(self.error());
            }
            if call < self.drop_terms_first {
                let garbled = text.replace("__TERM_0__", "la pastilla");
                return Ok(format!("[{}] {}", target_language, garbled));
            }
            Ok(format!("[{}] {}", target_language, text))
        }

        async fn detect(&self, _text: &str) -> Result<String, ProviderError> {
            let call = self.detect_calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(self.error());
            }
            Ok(self.detected.clone())
        }
    }

    fn client_with(provider: Arc<ScriptedProvider>) -> TranslationClient {
        TranslationClient::new(
            provider,
            Arc::new(LanguageCatalog::new()),
            Arc::new(TermDictionary::medical()),
            Arc::new(TranslationCache::new()),
        )
        .with_retry(RetryConfig::new(3, Duration::ZERO))
    }

    fn general() -> TranslationContext {
        TranslationContext::General
    }

    // ==================== Context Tests ====================

    #[test]
    fn test_context_parse() {
        assert_eq!(TranslationContext::parse(None), TranslationContext::General);
        assert_eq!(TranslationContext::parse(Some("  ")), TranslationContext::General);
        assert_eq!(
            TranslationContext::parse(Some("Medical")),
            TranslationContext::Medical
        );
        assert_eq!(
            TranslationContext::parse(Some("Legal")),
            TranslationContext::Custom("legal".to_string())
        );
    }

    #[test]
    fn test_context_as_str() {
        assert_eq!(TranslationContext::General.as_str(), "general");
        assert_eq!(TranslationContext::Medical.to_string(), "medical");
        assert_eq!(TranslationContext::Custom("legal".into()).as_str(), "legal");
    }

    // ==================== BatchTarget Tests ====================

    #[test]
    fn test_batch_target_single() {
        let target = BatchTarget::from("es");
        assert_eq!(target.for_index(0, "en"), "es");
        assert_eq!(target.for_index(99, "en"), "es");
    }

    #[test]
    fn test_batch_target_short_list_pads_with_default() {
        let target = BatchTarget::PerItem(vec!["es".into(), "hi".into()]);
        assert_eq!(target.for_index(0, "en"), "es");
        assert_eq!(target.for_index(1, "en"), "hi");
        assert_eq!(target.for_index(2, "en"), "en");
    }

    #[test]
    fn test_batch_target_deserializes_string_or_array() {
        let single: BatchTarget = serde_json::from_str(r#""es""#).unwrap();
        assert_eq!(single, BatchTarget::Single("es".into()));

        let many: BatchTarget = serde_json::from_str(r#"["es", "hi"]"#).unwrap();
        assert_eq!(many, BatchTarget::PerItem(vec!["es".into(), "hi".into()]));
    }

    // ==================== translate_text Tests ====================

    #[tokio::test]
    async fn test_default_language_is_identity_without_provider() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let result = client.translate_text("Take one pill", "en", &general()).await;

        assert_eq!(result, TranslationResult::unchanged("Take one pill"));
        assert_eq!(provider.translate_calls(), 0);
        assert_eq!(client.metrics().cache_misses, 0);
    }

    #[tokio::test]
    async fn test_default_language_comparison_ignores_case() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let result = client.translate_text("Hello", " EN ", &general()).await;

        assert!(result.success);
        assert_eq!(provider.translate_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_passes_through() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let result = client.translate_text("   ", "es", &general()).await;

        assert!(result.success);
        assert_eq!(result.translated_text, "   ");
        assert_eq!(provider.translate_calls(), 0);
    }

    #[tokio::test]
    async fn test_translate_success() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let result = client.translate_text("Drink water", "es", &general()).await;

        assert!(result.success);
        assert_eq!(result.translated_text, "[es] Drink water");
        assert_eq!(result.original_text, "Drink water");
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let first = client.translate_text("Drink water", "es", &general()).await;
        let second = client.translate_text("Drink water", "es", &general()).await;

        assert_eq!(first, second);
        assert_eq!(provider.translate_calls(), 1);

        let metrics = client.metrics();
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_context_separates_cache_entries() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        client.translate_text("Drink water", "es", &general()).await;
        client
            .translate_text("Drink water", "es", &TranslationContext::Medical)
            .await;

        assert_eq!(provider.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_target_falls_back_without_provider() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let result = client.translate_text("Drink water", "xx", &general()).await;

        assert!(!result.success);
        assert_eq!(result.translated_text, "Drink water");
        assert_eq!(
            result.error.as_deref(),
            Some("Unsupported target language: xx")
        );
        assert_eq!(provider.translate_calls(), 0);
    }

    #[tokio::test]
    async fn test_medical_terms_never_reach_provider() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let result = client
            .translate_text(
                "Take aspirin daily. Aspirin lowers blood pressure.",
                "es",
                &TranslationContext::Medical,
            )
            .await;

        let sent = provider.sent.lock().unwrap()[0].clone();
        assert!(!sent.to_lowercase().contains("aspirin"), "sent: {}", sent);
        assert!(!sent.contains("blood pressure"), "sent: {}", sent);
        assert!(sent.contains("__TERM_"));

        assert_eq!(
            result.translated_text,
            "[es] Take aspirin daily. Aspirin lowers blood pressure."
        );
    }

    #[tokio::test]
    async fn test_lost_placeholder_degrades_to_source_text() {
        let provider = Arc::new(ScriptedProvider::dropping_terms(usize::MAX));
        let client = client_with(provider.clone());

        let first = client
            .translate_text("Take metformin 500 now", "es", &TranslationContext::Medical)
            .await;

        assert!(!first.success);
        assert_eq!(first.translated_text, "Take metformin 500 now");
        assert!(first.error.unwrap().contains("__TERM_0__"));
        assert_eq!(provider.translate_calls(), 3);

        // Nothing was cached, so the next call goes back to the provider
        client
            .translate_text("Take metformin 500 now", "es", &TranslationContext::Medical)
            .await;
        assert_eq!(provider.translate_calls(), 6);
        assert_eq!(client.metrics().fallbacks, 2);
    }

    #[tokio::test]
    async fn test_lost_placeholder_is_retried() {
        let provider = Arc::new(ScriptedProvider::dropping_terms(1));
        let client = client_with(provider.clone());

        let result = client
            .translate_text("Take metformin 500 now", "es", &TranslationContext::Medical)
            .await;

        assert!(result.success);
        assert_eq!(result.translated_text, "[es] Take metformin 500 now");
        assert_eq!(provider.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_whitespace_variants_keep_their_own_edges() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let padded = client.translate_text("  Rest well\n", "es", &general()).await;
        let plain = client.translate_text("Rest well", "es", &general()).await;

        assert_eq!(padded.translated_text, "  [es] Rest well\n");
        assert_eq!(padded.original_text, "  Rest well\n");
        assert_eq!(plain.translated_text, "[es] Rest well");
        assert_eq!(provider.sent.lock().unwrap().as_slice(), ["Rest well"]);
        assert_eq!(provider.translate_calls(), 1);
    }

    #[test]
    fn test_split_edges() {
        assert_eq!(split_edges("  a b \n"), ("  ", "a b", " \n"));
        assert_eq!(split_edges("a"), ("", "a", ""));
        assert_eq!(split_edges("   "), ("   ", "", ""));
        assert_eq!(split_edges(""), ("", "", ""));
    }

    #[tokio::test]
    async fn test_general_context_sends_terms_verbatim() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        client.translate_text("Take aspirin", "es", &general()).await;

        assert_eq!(provider.sent.lock().unwrap()[0], "Take aspirin");
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let provider = Arc::new(ScriptedProvider::failing(2, 503));
        let client = client_with(provider.clone());

        let result = client.translate_text("Rest well", "es", &general()).await;

        assert!(result.success);
        assert_eq!(result.translated_text, "[es] Rest well");
        assert_eq!(provider.translate_calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_degrade_to_source_text() {
        let provider = Arc::new(ScriptedProvider::always_failing());
        let client = client_with(provider.clone());

        let result = client.translate_text("Rest well", "es", &general()).await;

        assert!(!result.success);
        assert_eq!(result.translated_text, result.original_text);
        assert!(result.error.unwrap().contains("503"));
        assert_eq!(provider.translate_calls(), 3);

        let metrics = client.metrics();
        assert_eq!(metrics.provider_failures, 1);
        assert_eq!(metrics.fallbacks, 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::failing(usize::MAX, 401));
        let client = client_with(provider.clone());

        let result = client.translate_text("Rest well", "es", &general()).await;

        assert!(!result.success);
        assert_eq!(provider.translate_calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_is_not_cached() {
        let provider = Arc::new(ScriptedProvider::failing(3, 503));
        let client = client_with(provider.clone());

        let first = client.translate_text("Rest well", "es", &general()).await;
        let second = client.translate_text("Rest well", "es", &general()).await;

        assert!(!first.success);
        assert!(second.success);
        assert_eq!(provider.translate_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_between_attempts() {
        let provider = Arc::new(ScriptedProvider::always_failing());
        let client = client_with(provider.clone())
            .with_retry(RetryConfig::new(3, Duration::from_millis(1000)));

        let start = tokio::time::Instant::now();
        client.translate_text("Rest well", "es", &general()).await;

        // 1s before the second attempt, 2s before the third
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_translation_expires() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone()).with_cache_ttl(Duration::from_secs(60));

        client.translate_text("Rest well", "es", &general()).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        client.translate_text("Rest well", "es", &general()).await;

        assert_eq!(provider.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_cache_forces_new_call() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        client.translate_text("Rest well", "es", &general()).await;
        assert_eq!(client.invalidate_cache(None), 1);
        client.translate_text("Rest well", "es", &general()).await;

        assert_eq!(provider.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_non_english_default_language() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone()).with_default_language("es");

        let identity = client.translate_text("Hola", "es", &general()).await;
        let english = client.translate_text("Hola", "en", &general()).await;

        assert_eq!(identity.translated_text, "Hola");
        assert_eq!(english.translated_text, "[en] Hola");
        assert_eq!(provider.translate_calls(), 1);
    }

    // ==================== Batch Tests ====================

    #[tokio::test]
    async fn test_batch_preserves_order_and_empty_entries() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let texts = ["one", "", "three"];
        let result = client
            .translate_batch(&texts, &BatchTarget::from("es"), &general())
            .await;

        assert_eq!(result, vec!["[es] one", "", "[es] three"]);
        assert_eq!(provider.translate_calls(), 2);
    }

    #[tokio::test]
    async fn test_batch_per_item_targets() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let texts = ["one", "two", "three"];
        let target = BatchTarget::PerItem(vec!["es".into(), "en".into()]);
        let result = client.translate_batch(&texts, &target, &general()).await;

        // "en" and the padded third entry are the default language
        assert_eq!(result, vec!["[es] one", "two", "three"]);
        assert_eq!(provider.translate_calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_failure_does_not_abort_others() {
        let provider = Arc::new(ScriptedProvider::failing(3, 503));
        let client = client_with(provider.clone());

        let texts = ["first", "second"];
        let result = client
            .translate_batch(&texts, &BatchTarget::from("es"), &general())
            .await;

        assert_eq!(result, vec!["first", "[es] second"]);
    }

    #[tokio::test]
    async fn test_concurrent_batch_matches_sequential() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let texts: Vec<String> = (0..12).map(|i| format!("item {}", i)).collect();
        let target = BatchTarget::from("hi");
        let concurrent = client
            .translate_batch_concurrent(&texts, &target, &general(), 4)
            .await;
        let sequential = client.translate_batch(&texts, &target, &general()).await;

        assert_eq!(concurrent, sequential);
        assert_eq!(concurrent[7], "[hi] item 7");
    }

    #[tokio::test]
    async fn test_concurrent_batch_zero_concurrency_still_runs() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        let result = client
            .translate_batch_concurrent(&["a"], &BatchTarget::from("es"), &general(), 0)
            .await;

        assert_eq!(result, vec!["[es] a"]);
    }

    proptest! {
        #[test]
        fn prop_batch_length_and_order(
            texts in prop::collection::vec("( {0,2}[a-z]{1,5}( [a-z]{1,5}){0,2} {0,2})?", 0..8),
        ) {
            let provider = Arc::new(ScriptedProvider::ok());
            let client = client_with(provider);

            let result = tokio_test::block_on(
                client.translate_batch(&texts, &BatchTarget::from("es"), &general()),
            );

            prop_assert_eq!(result.len(), texts.len());
            for (input, output) in texts.iter().zip(&result) {
                let (leading, core, trailing) = split_edges(input);
                if core.is_empty() {
                    prop_assert_eq!(output, input);
                } else {
                    prop_assert_eq!(output, &format!("{}[es] {}{}", leading, core, trailing));
                }
            }
        }
    }

    // ==================== Detection Tests ====================

    #[tokio::test]
    async fn test_detect_empty_text_skips_provider() {
        let provider = Arc::new(ScriptedProvider::ok());
        let client = client_with(provider.clone());

        assert_eq!(client.detect_language("  ").await, "en");
        assert_eq!(provider.detect_calls(), 0);
    }

    #[tokio::test]
    async fn test_detect_normalizes_code() {
        let provider = Arc::new(ScriptedProvider {
            detected: " ES ".to_string(),
            ..ScriptedProvider::ok()
        });
        let client = client_with(provider.clone());

        assert_eq!(client.detect_language("Hola").await, "es");
    }

    #[tokio::test]
    async fn test_detect_blank_answer_uses_default() {
        let provider = Arc::new(ScriptedProvider {
            detected: String::new(),
            ..ScriptedProvider::ok()
        });
        let client = client_with(provider.clone());

        assert_eq!(client.detect_language("Hola").await, "en");
    }

    #[tokio::test]
    async fn test_detect_failure_uses_default() {
        let provider = Arc::new(ScriptedProvider::always_failing());
        let client = client_with(provider.clone());

        assert_eq!(client.detect_language("Hola").await, "en");
        assert_eq!(provider.detect_calls(), 3);
    }

    // ==================== Utility Tests ====================

    #[test]
    fn test_translate_term_and_languages() {
        let client = client_with(Arc::new(ScriptedProvider::ok()));

        assert_eq!(client.translate_term("Blood Pressure", "es"), "presión arterial");
        assert_eq!(client.translate_term("unknownium", "es"), "unknownium");
        assert!(client.supported_languages().iter().any(|l| l.code == "hi"));
    }

    #[test]
    fn test_result_serialization_skips_missing_error() {
        let json = serde_json::to_value(TranslationResult::unchanged("hi")).unwrap();
        assert_eq!(json["translatedText"], "hi");
        assert_eq!(json["originalText"], "hi");
        assert!(json.get("error").is_none());
    }
}
