//! Transcript and per-segment sentiment models

use serde::{Deserialize, Serialize};

/// Speaker label attached to every enriched segment
///
/// Diarization is not performed; all speech is attributed to one speaker.
pub const DEFAULT_SPEAKER: &str = "Speaker 1";

/// Mood keyword used when no sentiment record exists for a segment
pub const UNKNOWN_MOOD: &str = "unknown";

/// Raw transcript segment as produced by the transcription service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: u32,
    /// Segment start (seconds)
    pub start: f64,
    /// Segment end (seconds)
    pub end: f64,
    pub text: String,
}

/// Transcription service output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    pub language: String,
    pub segments: Vec<TranscriptSegment>,
}

/// Sentiment polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Map a free-form label from an inference service onto a polarity
    ///
    /// Anything unrecognized is neutral.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

/// One record of a batch segment-sentiment response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSentimentRecord {
    pub segment_id: u32,
    pub sentiment: Sentiment,
    pub mood_keywords: Vec<String>,
}

/// Transcript segment with speaker and sentiment attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSegment {
    pub id: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub speaker: String,
    pub sentiment: Sentiment,
    pub mood_keywords: Vec<String>,
}

/// Transcript section of the analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSection {
    pub full_text: String,
    pub language: String,
    pub segments: Vec<EnrichedSegment>,
}
