//! Progress subscription endpoint
//!
//! GET /api/progress/:session_id streams `connected` then `progress` events for one
//! analysis session. Subscribing again with the same id replaces this stream.

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /api/progress/:session_id
pub async fn progress_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.sessions.subscribe(session_id);
    vidsight_common::sse::progress_sse_stream(subscription)
}

/// Build progress routes
pub fn progress_routes() -> Router<AppState> {
    Router::new().route("/api/progress/:session_id", get(progress_stream))
}
