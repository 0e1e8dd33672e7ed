use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;

/// Failures inside a single keyword's pipeline run.
///
/// The orchestrator catches all of these at its boundary and converts them into a
/// `failed` `GenerationResult`; they never reach the batch runner.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Structure generation failed: {0}")]
    StructureGeneration(String),

    #[error("Section '{section}' generation call failed: {reason}")]
    SectionGeneration { section: String, reason: String },

    #[error("Section '{section}' could not be parsed: {reason}")]
    SectionParse { section: String, reason: String },

    #[error("Section '{section}' failed validation: {reason}")]
    SectionValidation { section: String, reason: String },

    #[error("Optimization failed: {0}")]
    Optimization(String),

    #[error("Image generation failed: {0}")]
    ImageGeneration(String),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(e) => {
                tracing::error!("Pipeline error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PIPELINE_ERROR",
                    "A content generation error occurred".to_string(),
                )
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    "Results could not be exported".to_string(),
                )
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
