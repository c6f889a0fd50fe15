//! Error types for vidsight-ai
//!
//! Two failure kinds reach the caller:
//! - input validation (reported before any stage runs)
//! - stage execution (reported after partial work, cleanup already done)
//!
//! Everything else (per-frame detection, missing segment sentiment, QA generation)
//! is absorbed inside the pipeline with a documented default.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::Stage;

/// Orchestrator failure
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed upload, wrong media type, or invalid credential shape
    #[error("{0}")]
    InputValidation(String),

    /// Upload exceeded the configured size limit
    #[error("Video exceeds maximum upload size of {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: u64 },

    /// A collaborator call failed; the pipeline stopped at `stage`
    #[error("Stage {stage:?} failed: {message}")]
    StageExecution { stage: Stage, message: String },
}

impl AnalysisError {
    pub fn stage(stage: Stage, err: impl std::fmt::Display) -> Self {
        AnalysisError::StageExecution {
            stage,
            message: err.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnalysisError::InputValidation(_) | AnalysisError::PayloadTooLarge { .. }
        )
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload too large (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error (500), with optional diagnostic detail
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    /// Map an orchestrator failure onto an HTTP error
    ///
    /// Stage failure detail is included only when `expose_details` is set.
    pub fn from_analysis(err: AnalysisError, expose_details: bool) -> Self {
        match err {
            AnalysisError::InputValidation(msg) => ApiError::BadRequest(msg),
            err @ AnalysisError::PayloadTooLarge { .. } => {
                ApiError::PayloadTooLarge(err.to_string())
            }
            err @ AnalysisError::StageExecution { .. } => ApiError::Internal {
                message: "Video processing failed".to_string(),
                details: expose_details.then(|| err.to_string()),
            },
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg, None),
            ApiError::Internal { message, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, details)
            }
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
