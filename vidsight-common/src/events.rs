//! Progress event types
//!
//! A [`ProgressEvent`] is what the stage orchestrator emits at each stage boundary.
//! A [`ChannelMessage`] is what a progress subscriber actually receives on the wire.

use serde::{Deserialize, Serialize};

/// One stage-boundary progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage ordinal within the fixed stage sequence
    pub step_index: u32,
    /// Human-readable description of what is happening
    pub message: String,
    /// Overall completion, 0.0 - 100.0
    pub percentage: f64,
}

impl ProgressEvent {
    /// Create a progress event, clamping the percentage into [0, 100]
    pub fn new(step_index: u32, message: impl Into<String>, percentage: f64) -> Self {
        Self {
            step_index,
            message: message.into(),
            percentage: percentage.clamp(0.0, 100.0),
        }
    }
}

/// Messages delivered over a progress channel
///
/// Serialized with a `type` tag:
/// - `{"type":"connected"}` once, right after subscribing
/// - `{"type":"progress","step":N,"message":"...","progress":P}` thereafter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelMessage {
    /// Subscription acknowledged
    Connected,
    /// Stage progress update
    Progress {
        step: u32,
        message: String,
        progress: f64,
    },
}

impl ChannelMessage {
    /// SSE event name for this message
    pub fn event_type(&self) -> &'static str {
        match self {
            ChannelMessage::Connected => "connected",
            ChannelMessage::Progress { .. } => "progress",
        }
    }
}

impl From<ProgressEvent> for ChannelMessage {
    fn from(event: ProgressEvent) -> Self {
        ChannelMessage::Progress {
            step: event.step_index,
            message: event.message,
            progress: event.percentage,
        }
    }
}
