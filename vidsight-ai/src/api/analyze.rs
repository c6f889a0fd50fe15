//! Video analysis endpoint
//!
//! POST /api/analyze (multipart/form-data)
//!
//! | field       | content                                   |
//! |-------------|-------------------------------------------|
//! | `video`     | video file                                |
//! | `apiKey`    | API key, or `demo` / `demo-key`           |
//! | `sessionId` | optional progress session id              |
//! | `demo`      | optional flag (`true`/`1`/`yes`/`on`)     |
//!
//! The video is streamed to `uploads/` under a generated name; the orchestrator
//! removes it when the request finishes.

use axum::{
    extract::{multipart::Field, multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AnalysisError, ApiError, ApiResult};
use crate::models::{AnalysisRequest, AnalysisResponse, UploadedMedia};
use crate::AppState;

const VIDEO_FIELD: &str = "video";
const API_KEY_FIELD: &str = "apiKey";
const SESSION_ID_FIELD: &str = "sessionId";
const DEMO_FIELD: &str = "demo";

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn storage_error(err: std::io::Error) -> ApiError {
    tracing::error!(error = %err, "Failed to write upload");
    ApiError::Internal {
        message: "Failed to store upload".to_string(),
        details: None,
    }
}

/// Generated storage name keeping a sanitized extension of the client filename
fn stored_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());

    format!("{}.{}", Uuid::new_v4(), extension)
}

/// Stream one file field to `path`, enforcing `limit` bytes
async fn store_field(field: &mut Field<'_>, path: &Path, limit: u64) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(path).await.map_err(storage_error)?;

    let mut written: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        written += chunk.len() as u64;
        if written > limit {
            return Err(ApiError::from_analysis(
                AnalysisError::PayloadTooLarge { limit_bytes: limit },
                false,
            ));
        }
        file.write_all(&chunk).await.map_err(storage_error)?;
    }

    file.flush().await.map_err(storage_error)?;

    Ok(written)
}

/// Read the form into `request`; a stored video is recorded as soon as it is complete
async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
    request: &mut AnalysisRequest,
    partial: &mut Option<PathBuf>,
) -> ApiResult<()> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            VIDEO_FIELD => {
                if request.media.is_some() {
                    return Err(ApiError::BadRequest(
                        "Only one video file may be uploaded".to_string(),
                    ));
                }

                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let path = state.config.uploads_dir().join(stored_name(&original_name));

                *partial = Some(path.clone());
                let size_bytes = store_field(&mut field, &path, state.config.max_upload_bytes).await?;

                tracing::debug!(
                    file = %original_name,
                    stored = %path.display(),
                    size_bytes,
                    "Upload stored"
                );

                request.media = Some(UploadedMedia {
                    path,
                    original_name,
                    content_type,
                    size_bytes,
                });
            }
            API_KEY_FIELD => {
                request.credential = field.text().await.map_err(multipart_error)?.trim().to_string();
            }
            SESSION_ID_FIELD => {
                let id = field.text().await.map_err(multipart_error)?;
                request.session_id = Some(id.trim().to_string()).filter(|id| !id.is_empty());
            }
            DEMO_FIELD => {
                request.demo = parse_flag(&field.text().await.map_err(multipart_error)?);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(())
}

/// POST /api/analyze
pub async fn analyze_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisResponse>> {
    let mut request = AnalysisRequest::default();
    let mut partial: Option<PathBuf> = None;

    if let Err(e) = read_form(&state, &mut multipart, &mut request, &mut partial).await {
        if let Some(path) = partial {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %path.display(),
                        error = %remove_err,
                        "Failed to remove partial upload"
                    );
                }
            }
        }
        tracing::warn!(error = %e, "Rejected analysis upload");
        return Err(e);
    }

    state
        .orchestrator
        .process(request)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_analysis(e, state.config.expose_error_details))
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze_video))
}
