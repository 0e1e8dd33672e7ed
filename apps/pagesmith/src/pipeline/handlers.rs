//! Axum route handlers for the Pages and SEO APIs.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::export::{export_results, write_page_artifacts, ExportFormat};
use crate::generation::models::Outline;
use crate::pipeline::batch::{calculate_batch_stats, run_batch, BatchStats};
use crate::pipeline::{GenerationResult, PipelineConfig};
use crate::seo::SeoResult;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeneratePageRequest {
    pub keyword: String,
    #[serde(default)]
    pub config: PipelineConfig,
    /// Write the page artifacts to the output directory.
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Deserialize)]
pub struct OutlineRequest {
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub config: PipelineConfig,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<GenerationResult>,
    pub stats: BatchStats,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub content: String,
    pub keyword: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/pages
///
/// Runs the full pipeline for one keyword. Generation failures are reported in
/// the result's `status`, not as an HTTP error.
pub async fn handle_generate_page(
    State(state): State<AppState>,
    Json(request): Json<GeneratePageRequest>,
) -> Result<Json<GenerationResult>, AppError> {
    let keyword = require_keyword(&request.keyword)?;

    let result = state
        .pipeline
        .generate_optimized_content(keyword, &request.config)
        .await;

    if !request.persist {
        return Ok(Json(result));
    }

    let artifacts = write_page_artifacts(
        &state.config.output_dir,
        &result,
        state.config.site_base_url.as_deref(),
    )
    .await?;

    Ok(Json(result.with_url(artifacts.url)))
}

/// POST /api/v1/pages/outline
///
/// Plans the section outline only. Lets editors review the structure before
/// paying for a full generation.
pub async fn handle_plan_outline(
    State(state): State<AppState>,
    Json(request): Json<OutlineRequest>,
) -> Result<Json<Outline>, AppError> {
    let keyword = require_keyword(&request.keyword)?;
    let outline = state.pipeline.planner().plan(keyword).await?;
    Ok(Json(outline))
}

/// POST /api/v1/pages/batch
pub async fn handle_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let keywords = require_keywords(&request.keywords)?;

    let results = run_batch(state.pipeline.as_ref(), &keywords, &request.config).await;
    let stats = calculate_batch_stats(&results);

    Ok(Json(BatchResponse { results, stats }))
}

/// POST /api/v1/pages/batch/export?format=json|csv
///
/// Runs a batch and returns the serialized results as a file body.
pub async fn handle_batch_export(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<BatchRequest>,
) -> Result<Response, AppError> {
    let keywords = require_keywords(&request.keywords)?;

    let results = run_batch(state.pipeline.as_ref(), &keywords, &request.config).await;
    let body = export_results(&results, query.format)?;

    Ok(([(header::CONTENT_TYPE, query.format.content_type())], body).into_response())
}

/// POST /api/v1/seo/validate
///
/// Scores arbitrary HTML against the rubric. No network calls.
pub async fn handle_validate_seo(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<SeoResult>, AppError> {
    let keyword = require_keyword(&request.keyword)?;
    Ok(Json(state.validator.validate(&request.content, keyword)))
}

fn require_keyword(keyword: &str) -> Result<&str, AppError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::Validation("keyword cannot be empty".to_string()));
    }
    Ok(keyword)
}

fn require_keywords(keywords: &[String]) -> Result<Vec<String>, AppError> {
    if keywords.is_empty() {
        return Err(AppError::Validation("keywords cannot be empty".to_string()));
    }
    keywords
        .iter()
        .map(|k| require_keyword(k).map(str::to_string))
        .collect()
}
