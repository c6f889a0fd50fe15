//! Sentiment analysis and summarization via a text chat model

use super::{InferenceError, OpenAiClient, SentimentAnalyzer};
use crate::models::{SegmentSentimentRecord, Sentiment, SentimentResult, TranscriptSegment};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

const SUMMARY_PROMPT: &str = "You analyze video transcripts. Respond with a JSON object: \
{\"overall_sentiment\": \"positive\" | \"neutral\" | \"negative\", \
\"mood_keywords\": [up to 5 single words], \"confidence\": number between 0 and 1, \
\"short_summary\": one or two sentences}.";

const SEGMENT_PROMPT: &str = "You classify the sentiment of transcript segments. You receive a \
JSON array of {\"id\", \"text\"}. Respond with a JSON object \
{\"segments\": [{\"segment_id\": id, \"sentiment\": \"positive\" | \"neutral\" | \"negative\", \
\"mood_keywords\": [up to 3 single words]}]} with one entry per input segment.";

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(default)]
    overall_sentiment: String,
    #[serde(default)]
    mood_keywords: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    short_summary: String,
}

#[derive(Debug, Deserialize)]
struct RawSegmentBatch {
    #[serde(default)]
    segments: Vec<RawSegmentSentiment>,
}

#[derive(Debug, Deserialize)]
struct RawSegmentSentiment {
    segment_id: u32,
    #[serde(default)]
    sentiment: String,
    #[serde(default)]
    mood_keywords: Vec<String>,
}

fn parse_summary(value: Value) -> Result<SentimentResult, InferenceError> {
    let raw: RawSummary =
        serde_json::from_value(value).map_err(|e| InferenceError::ParseError(e.to_string()))?;

    Ok(SentimentResult {
        overall_sentiment: Sentiment::from_label(&raw.overall_sentiment),
        mood_keywords: raw.mood_keywords,
        confidence: raw
            .confidence
            .filter(|c| c.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0),
        short_summary: raw.short_summary,
    })
}

fn parse_segment_batch(value: Value) -> Result<Vec<SegmentSentimentRecord>, InferenceError> {
    let raw: RawSegmentBatch =
        serde_json::from_value(value).map_err(|e| InferenceError::ParseError(e.to_string()))?;

    Ok(raw
        .segments
        .into_iter()
        .map(|s| SegmentSentimentRecord {
            segment_id: s.segment_id,
            sentiment: Sentiment::from_label(&s.sentiment),
            mood_keywords: s.mood_keywords,
        })
        .collect())
}

#[async_trait]
impl SentimentAnalyzer for OpenAiClient {
    async fn summarize(&self, full_text: &str) -> Result<SentimentResult, InferenceError> {
        let value = self
            .chat_json(&self.models.text, SUMMARY_PROMPT, Value::String(full_text.to_string()))
            .await?;
        parse_summary(value)
    }

    async fn batch_segments(
        &self,
        segments: &[TranscriptSegment],
    ) -> Result<Vec<SegmentSentimentRecord>, InferenceError> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let input: Vec<Value> = segments
            .iter()
            .map(|s| json!({ "id": s.id, "text": s.text }))
            .collect();

        let value = self
            .chat_json(&self.models.text, SEGMENT_PROMPT, Value::String(Value::Array(input).to_string()))
            .await?;
        parse_segment_batch(value)
    }
}
