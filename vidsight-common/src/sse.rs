//! Server-Sent Events (SSE) utilities
//!
//! Turns a [`ProgressSubscription`] into an SSE response.

use crate::session::ProgressSubscription;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Create an SSE stream that forwards one session's progress channel
///
/// Emits `connected` first, then `progress` events, and ends when the channel is
/// unregistered (pipeline finished) or replaced by a newer subscriber. When the
/// client disconnects the stream is dropped, which unregisters the subscription.
///
/// # Example
/// ```rust,ignore
/// pub async fn progress_stream(
///     State(state): State<AppState>,
///     Path(session_id): Path<String>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     let subscription = state.sessions.subscribe(session_id);
///     vidsight_common::sse::progress_sse_stream(subscription)
/// }
/// ```
pub fn progress_sse_stream(
    mut subscription: ProgressSubscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(session_id = %subscription.session_id(), "New SSE client connected to progress channel");

    let stream = async_stream::stream! {
        while let Some(message) = subscription.recv().await {
            match serde_json::to_string(&message) {
                Ok(data) => {
                    debug!(
                        session_id = %subscription.session_id(),
                        event = message.event_type(),
                        "SSE: Forwarding progress message"
                    );
                    yield Ok(Event::default().event(message.event_type()).data(data));
                }
                Err(e) => {
                    warn!("SSE: Failed to serialize progress message: {}", e);
                }
            }
        }

        info!(session_id = %subscription.session_id(), "SSE: Progress channel closed");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
