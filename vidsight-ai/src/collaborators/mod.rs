//! External collaborators
//!
//! The pipeline only talks to media decoding and inference services through the
//! traits below. Production implementations:
//! - [`FfmpegDecoder`]: ffprobe/ffmpeg command-line tools
//! - [`OpenAiClient`]: OpenAI-compatible HTTP API (transcription, vision, text)
//!
//! The caller's API key arrives with each request, so a [`CollaboratorProvider`]
//! builds a fresh [`Collaborators`] bundle per request.

mod ffmpeg;
mod openai;
mod qa;
mod sentiment;
mod transcription;
mod vision;

pub use ffmpeg::{DecodeError, FfmpegDecoder};
pub use openai::{InferenceError, OpenAiClient, OpenAiProvider};
pub use qa::parse_qa_response;

use crate::models::{
    FrameDetection, QaPair, SegmentSentimentRecord, SentimentResult, TranscriptSegment,
    Transcription,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Media decoding tool
#[async_trait]
pub trait MediaDecoder: Send + Sync {
    /// Container duration in seconds
    async fn probe_duration(&self, video: &Path) -> Result<f64, DecodeError>;

    /// Extract the audio track as 16 kHz mono PCM WAV at `output`
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<PathBuf, DecodeError>;

    /// Sample frames at `fps` into `output_dir`, returned in ordinal order
    async fn extract_frames(
        &self,
        video: &Path,
        output_dir: &Path,
        fps: f64,
    ) -> Result<Vec<PathBuf>, DecodeError>;
}

/// Speech-to-text service
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, InferenceError>;
}

/// Vision object detection service
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, frame: &Path) -> Result<Vec<FrameDetection>, InferenceError>;
}

/// Text sentiment and summarization service
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    /// Whole-transcript sentiment and short summary
    async fn summarize(&self, full_text: &str) -> Result<SentimentResult, InferenceError>;

    /// Per-segment sentiment; records may be missing for some segments
    async fn batch_segments(
        &self,
        segments: &[TranscriptSegment],
    ) -> Result<Vec<SegmentSentimentRecord>, InferenceError>;
}

/// Question/answer generation service
#[async_trait]
pub trait QaGenerator: Send + Sync {
    async fn generate_qa(
        &self,
        full_text: &str,
        desired_count: usize,
        segments: Option<&[TranscriptSegment]>,
    ) -> Result<Vec<QaPair>, InferenceError>;
}

/// Collaborators used by one request
#[derive(Clone)]
pub struct Collaborators {
    pub decoder: Arc<dyn MediaDecoder>,
    pub transcriber: Arc<dyn Transcriber>,
    pub detector: Arc<dyn ObjectDetector>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub qa: Arc<dyn QaGenerator>,
}

/// Builds the collaborator bundle for a request's credential
pub trait CollaboratorProvider: Send + Sync {
    fn for_credential(&self, api_key: &str) -> Collaborators;
}
