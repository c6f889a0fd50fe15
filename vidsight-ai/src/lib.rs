//! vidsight-ai library interface
//!
//! Multi-modal video analysis service: transcription, per-segment and overall
//! sentiment, object detection and question generation merged into one result,
//! with per-session progress streamed over SSE.

pub mod api;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{AnalysisError, ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vidsight_common::SessionRegistry;

use crate::collaborators::CollaboratorProvider;
use crate::config::ServiceConfig;
use crate::services::AnalysisOrchestrator;

/// Room for the non-file form fields and multipart framing
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    /// Progress channels, shared with the orchestrator
    pub sessions: SessionRegistry,
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServiceConfig, provider: Arc<dyn CollaboratorProvider>) -> Self {
        let config = Arc::new(config);
        let sessions = SessionRegistry::new();
        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            config.clone(),
            sessions.clone(),
            provider,
        ));

        Self {
            config,
            sessions,
            orchestrator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.max_upload_bytes + FORM_OVERHEAD_BYTES)
        .unwrap_or(usize::MAX);

    Router::new()
        .merge(api::analyze_routes())
        .merge(api::progress_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
