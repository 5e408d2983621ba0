//! HTTP mode: translation, prompt and small in-memory batches over JSON.

use crate::tabular::{ColumnPlan, ColumnRef, Table, WideningPolicy};
use crate::translation::{
    handoff_prompt, master_prompt, BatchStatus, BatchTranslator, Category, ConfiguredLimiter,
    Level, RowFailure, TranslationConfiguration, Translator,
};
use crate::utils::{AppConfig, TranslatorError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct ServerState<T> {
    pub config: AppConfig,
    pub translator: T,
}

impl<T> ServerState<T> {
    pub fn new(config: AppConfig, translator: T) -> Self {
        Self { config, translator }
    }

    fn translation_config(
        &self,
        category: Option<Category>,
        level: Option<Level>,
    ) -> TranslationConfiguration {
        TranslationConfiguration::new(
            category.unwrap_or(self.config.translation.category),
            level.unwrap_or(self.config.translation.level),
        )
    }
}

type SharedState<T> = Arc<ServerState<T>>;

pub fn router<T>(state: ServerState<T>) -> Router
where
    T: Translator + Clone + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/translate", post(translate_handler::<T>))
        .route("/prompt", post(prompt_handler::<T>))
        .route("/batch", post(batch_handler::<T>))
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve<T>(state: ServerState<T>, addr: &str) -> crate::utils::Result<()>
where
    T: Translator + Clone + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP Server listening on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /info       - Server info");
    tracing::info!("  POST /translate  - Translate one sentence");
    tracing::info!("  POST /prompt     - Master and hand-off prompts");
    tracing::info!("  POST /batch      - Translate one column of a table");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

struct ApiFailure(TranslatorError);

impl From<TranslatorError> for ApiFailure {
    fn from(e: TranslatorError) -> Self {
        ApiFailure(e)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match self.0 {
            TranslatorError::ValidationError(_)
            | TranslatorError::InvalidColumnReference(_)
            | TranslatorError::ColumnOutOfRange { .. }
            | TranslatorError::UnknownOption { .. } => StatusCode::BAD_REQUEST,
            TranslatorError::ApiError(_) | TranslatorError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sheet-translator",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "sheet-translator",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "English to Korean column translation - HTTP Mode",
        "categories": Category::ALL.iter().map(|c| c.name()).collect::<Vec<_>>(),
        "levels": Level::ALL.iter().map(|l| l.name()).collect::<Vec<_>>(),
        "endpoints": {
            "GET /health": "Health check",
            "GET /info": "Server info",
            "POST /translate": "Translate one sentence",
            "POST /prompt": "Master and hand-off prompts",
            "POST /batch": "Translate one column of a table"
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub category: Option<Category>,
    pub level: Option<Level>,
}

async fn translate_handler<T>(
    State(state): State<SharedState<T>>,
    Json(request): Json<TranslateRequest>,
) -> Result<impl IntoResponse, ApiFailure>
where
    T: Translator + Clone + 'static,
{
    let config = state.translation_config(request.category, request.level);
    let batch = BatchTranslator::new(state.translator.clone(), config);
    let translation = batch.translate_text(&request.text).await?;

    Ok(Json(serde_json::json!({
        "translation": translation,
        "config": config,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub category: Option<Category>,
    pub level: Option<Level>,
    pub source_column: Option<String>,
    pub target_column: Option<String>,
}

async fn prompt_handler<T>(
    State(state): State<SharedState<T>>,
    Json(request): Json<PromptRequest>,
) -> Result<impl IntoResponse, ApiFailure>
where
    T: Translator + Clone + 'static,
{
    let config = state.translation_config(request.category, request.level);
    let defaults = &state.config.translation;
    let source = ColumnRef::parse(request.source_column.as_deref().unwrap_or(&defaults.source_column))?;
    let target = ColumnRef::parse(request.target_column.as_deref().unwrap_or(&defaults.target_column))?;

    Ok(Json(serde_json::json!({
        "config": config,
        "master_prompt": master_prompt(&config),
        "handoff_prompt": handoff_prompt(&config, source, target),
    })))
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub source_column: Option<String>,
    pub target_column: Option<String>,
    pub category: Option<Category>,
    pub level: Option<Level>,
    pub widening: Option<WideningPolicy>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub run_id: String,
    pub status: BatchStatus,
    pub target_column: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub translated: usize,
    pub blank: usize,
    pub failed: usize,
    pub failures: Vec<RowFailure>,
    pub summary: String,
}

async fn batch_handler<T>(
    State(state): State<SharedState<T>>,
    Json(request): Json<BatchRequest>,
) -> Result<impl IntoResponse, ApiFailure>
where
    T: Translator + Clone + 'static,
{
    let config = state.translation_config(request.category, request.level);
    let defaults = &state.config.translation;
    let plan = ColumnPlan::parse(
        request.source_column.as_deref().unwrap_or(&defaults.source_column),
        request.target_column.as_deref().unwrap_or(&defaults.target_column),
    )?;

    let batch = BatchTranslator::new(state.translator.clone(), config)
        .with_widening(request.widening.unwrap_or(defaults.widening))
        .with_rate_limiter(ConfiguredLimiter::from_interval(defaults.rate_limit()));

    let outcome = batch
        .run(Table::new(request.headers, request.rows), plan)
        .await?;

    let summary = outcome.summary();
    tracing::info!(run_id = %outcome.run_id, "{}", summary);

    let translated = outcome.translated_count();
    let blank = outcome.blank_count();
    let failed = outcome.failed_count();
    let (headers, rows) = outcome.table.into_parts();

    Ok(Json(BatchResponse {
        run_id: outcome.run_id.to_string(),
        status: outcome.status,
        target_column: crate::tabular::column_name(outcome.target_index),
        headers,
        rows,
        translated,
        blank,
        failed,
        failures: outcome.failures,
        summary,
    }))
}
