//! Data models for vidsight-ai

pub mod analysis_result;
pub mod analysis_session;
pub mod detection;
pub mod request;
pub mod transcript;

pub use analysis_result::{
    AnalysisResponse, AnalysisResult, QaPair, ResultMetadata, SentimentResult, Snippet,
};
pub use analysis_session::{AnalysisSession, Stage, StageMilestone, StageTransition};
pub use detection::{DetectedObjectFrame, DetectedObjectSummary, ExtractedFrame, FrameDetection};
pub use request::{AnalysisRequest, UploadedMedia};
pub use transcript::{
    EnrichedSegment, SegmentSentimentRecord, Sentiment, TranscriptSection, TranscriptSegment,
    Transcription, DEFAULT_SPEAKER, UNKNOWN_MOOD,
};
