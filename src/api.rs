//! Thin JSON HTTP surface over the translation client and readability scorer.
//!
//! Handlers validate required fields and language codes, then delegate. The
//! pipeline itself never fails, so the only error responses are 400s.

use crate::i18n::LanguageEntry;
use crate::readability::{ReadabilityReport, ReadabilityScorer};
use crate::translation::{BatchTarget, TranslationClient, TranslationContext, TranslationResult};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
pub struct AppState {
    pub client: TranslationClient,
    pub scorer: ReadabilityScorer,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidField {
            field: "body",
            reason: rejection.body_text(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/languages", get(list_languages))
        .route("/api/translate", post(translate))
        .route("/api/translate/batch", post(translate_batch))
        .route("/api/detect", post(detect))
        .route("/api/readability", post(readability))
        .route("/api/cache", delete(invalidate_cache))
        .route("/api/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::MissingField(field))
}

fn supported_language(
    state: &AppState,
    code: Option<String>,
    field: &'static str,
) -> Result<String, ApiError> {
    let code = required_text(code, field)?.trim().to_lowercase();
    if !state.client.is_supported(&code) {
        return Err(ApiError::UnsupportedLanguage(code));
    }
    Ok(code)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LanguagesResponse<'a> {
    languages: &'a [LanguageEntry],
    default_language: &'a str,
}

async fn list_languages(State(state): State<Arc<AppState>>) -> Response {
    Json(LanguagesResponse {
        languages: state.client.supported_languages(),
        default_language: state.client.default_language(),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest {
    text: Option<String>,
    target_language: Option<String>,
    context: Option<String>,
}

async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslationResult>, ApiError> {
    let Json(request) = payload?;
    let text = required_text(request.text, "text")?;
    let target = supported_language(&state, request.target_language, "targetLanguage")?;
    let context = TranslationContext::parse(request.context.as_deref());

    Ok(Json(
        state.client.translate_text(&text, &target, &context).await,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchRequest {
    texts: Option<Vec<String>>,
    target_language: Option<BatchTarget>,
    context: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchResponse {
    translations: Vec<String>,
}

async fn translate_batch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(request) = payload?;
    let texts = request
        .texts
        .filter(|texts| !texts.is_empty())
        .ok_or(ApiError::MissingField("texts"))?;

    let target = match request.target_language {
        Some(BatchTarget::Single(code)) => BatchTarget::Single(supported_language(
            &state,
            Some(code),
            "targetLanguage",
        )?),
        Some(BatchTarget::PerItem(codes)) => BatchTarget::PerItem(
            codes
                .into_iter()
                .map(|code| supported_language(&state, Some(code), "targetLanguage"))
                .collect::<Result<_, _>>()?,
        ),
        None => return Err(ApiError::MissingField("targetLanguage")),
    };
    let context = TranslationContext::parse(request.context.as_deref());

    info!(
        "Batch translation of {} texts ({} context)",
        texts.len(),
        context
    );
    let translations = state
        .client
        .translate_batch(&texts, &target, &context)
        .await;

    Ok(Json(BatchResponse { translations }))
}

#[derive(Debug, Deserialize)]
struct DetectRequest {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct DetectResponse {
    language: String,
}

async fn detect(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let Json(request) = payload?;
    let text = required_text(request.text, "text")?;

    Ok(Json(DetectResponse {
        language: state.client.detect_language(&text).await,
    }))
}

#[derive(Debug, Deserialize)]
struct ReadabilityRequest {
    text: Option<String>,
    language: Option<String>,
}

async fn readability(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReadabilityRequest>, JsonRejection>,
) -> Result<Json<ReadabilityReport>, ApiError> {
    let Json(request) = payload?;
    let text = required_text(request.text, "text")?;
    let language = match request.language {
        Some(code) => supported_language(&state, Some(code), "language")?,
        None => state.client.default_language().to_string(),
    };

    Ok(Json(state.scorer.analyze(&text, &language)))
}

#[derive(Debug, Deserialize)]
struct CacheQuery {
    key: Option<String>,
}

async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CacheQuery>,
) -> Json<serde_json::Value> {
    let key = query.key.as_deref().filter(|k| !k.is_empty());
    let invalidated = state.client.invalidate_cache(key);
    info!("Invalidated {} cache entries", invalidated);

    Json(serde_json::json!({ "invalidated": invalidated }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    Json(state.client.metrics()).into_response()
}
