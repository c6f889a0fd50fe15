//! Analysis result schema
//!
//! The same schema is produced by the real pipeline and by demo mode.

use super::detection::DetectedObjectSummary;
use super::transcript::{Sentiment, TranscriptSection};
use serde::{Deserialize, Serialize};

/// Whole-transcript sentiment and summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub overall_sentiment: Sentiment,
    pub mood_keywords: Vec<String>,
    /// Model confidence (0.0 - 1.0)
    pub confidence: f64,
    pub short_summary: String,
}

/// Transcript excerpt backing a QA answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub segment_id: u32,
    pub text: String,
}

/// Generated question with its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    #[serde(rename = "relevantSnippets")]
    pub relevant_snippets: Vec<Snippet>,
}

impl QaPair {
    /// Stand-in pair used when question generation fails
    pub fn fallback(reason: &str) -> Self {
        Self {
            question: "error".to_string(),
            answer: format!("Unable to generate questions: {}", reason),
            relevant_snippets: vec![Snippet {
                segment_id: 0,
                text: String::new(),
            }],
        }
    }
}

/// Result metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// Original upload filename
    pub video_file: String,
    /// Probed duration (seconds)
    pub video_duration: f64,
    /// RFC 3339 completion timestamp
    pub processed_at: String,
    /// Wall-clock processing time (seconds, 2 decimals)
    pub processing_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Unified multi-modal analysis of one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metadata: ResultMetadata,
    pub transcript: TranscriptSection,
    pub sentiment: SentimentResult,
    pub objects_detected: Vec<DetectedObjectSummary>,
    pub qa_pairs: Vec<QaPair>,
}

impl AnalysisResult {
    pub fn is_demo(&self) -> bool {
        self.metadata.demo_mode == Some(true)
    }
}

/// `POST /api/analyze` success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_pair_shape() {
        let pair = QaPair::fallback("timeout");
        let json = serde_json::to_value(&pair).unwrap();

        assert_eq!(json["question"], "error");
        assert!(json["answer"].as_str().unwrap().contains("timeout"));
        assert_eq!(json["relevantSnippets"].as_array().unwrap().len(), 1);
        assert_eq!(json["relevantSnippets"][0]["text"], "");
    }

    #[test]
    fn test_metadata_omits_demo_fields_when_absent() {
        let metadata = ResultMetadata {
            video_file: "clip.mp4".to_string(),
            video_duration: 12.5,
            processed_at: "2025-01-01T00:00:00Z".to_string(),
            processing_time: 3.21,
            demo_mode: None,
            note: None,
        };
        let json = serde_json::to_value(&metadata).unwrap();

        assert_eq!(json["videoFile"], "clip.mp4");
        assert_eq!(json["videoDuration"], 12.5);
        assert!(json.get("demoMode").is_none());
        assert!(json.get("note").is_none());
    }
}
