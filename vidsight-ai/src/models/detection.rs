//! Frame and object detection models

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One frame produced by frame extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFrame {
    /// 1-based position in the full, unsampled frame sequence
    pub ordinal: u32,
    /// Image file on disk
    pub path: PathBuf,
}

/// Raw detection for a single frame, as returned by the vision service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetection {
    pub name: String,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f64,
    #[serde(default)]
    pub context: String,
}

/// One appearance of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObjectFrame {
    /// Frame ordinal (1-based, unsampled sequence)
    pub frame_id: u32,
    /// Seconds from video start: `(frame_id - 1) / fps`
    pub timestamp: f64,
    pub confidence: f64,
    pub context: String,
}

/// Per-object statistics across the whole video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObjectSummary {
    /// Lower-cased object name
    pub name: String,
    /// Share of all extracted frames containing the object, 1 decimal
    pub appearance_percentage: f64,
    /// Mean detection confidence, 2 decimals
    pub avg_confidence: f64,
    /// Appearances in ascending `frame_id` order
    pub frames: Vec<DetectedObjectFrame>,
}
