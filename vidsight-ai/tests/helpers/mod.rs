//! Shared test helpers: scripted collaborators and app state on a temp directory
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vidsight_ai::collaborators::{
    CollaboratorProvider, Collaborators, DecodeError, InferenceError, MediaDecoder,
    ObjectDetector, QaGenerator, SentimentAnalyzer, Transcriber,
};
use vidsight_ai::config::ServiceConfig;
use vidsight_ai::models::{
    AnalysisRequest, FrameDetection, QaPair, SegmentSentimentRecord, Sentiment, SentimentResult,
    Snippet, TranscriptSegment, Transcription, UploadedMedia,
};
use vidsight_ai::AppState;

pub const TEST_API_KEY: &str = "sk-test-key";
pub const VIDEO_DURATION: f64 = 4.0;

/// Scripted collaborator behaviour
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Frames produced by frame extraction
    pub frame_count: usize,
    pub fail_probe: bool,
    pub fail_transcription: bool,
    pub fail_detection: bool,
    pub fail_qa: bool,
}

/// Every collaborator in one scripted fake, recording each call
pub struct FakeWorld {
    script: Script,
    calls: Mutex<Vec<String>>,
}

impl FakeWorld {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// File names of frames submitted for detection, sorted
    pub fn detected_frames(&self) -> Vec<String> {
        let mut frames: Vec<String> = self
            .calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("detect:").map(str::to_string))
            .collect();
        frames.sort();
        frames
    }
}

fn frame_name(ordinal: usize) -> String {
    format!("frame_{:04}.jpg", ordinal)
}

#[async_trait]
impl MediaDecoder for FakeWorld {
    async fn probe_duration(&self, _video: &Path) -> Result<f64, DecodeError> {
        self.record("probe");
        if self.script.fail_probe {
            return Err(DecodeError::DecodeFailed {
                tool: "ffprobe".to_string(),
                code: Some(1),
                stderr: "moov atom not found".to_string(),
            });
        }
        Ok(VIDEO_DURATION)
    }

    async fn extract_audio(&self, _video: &Path, output: &Path) -> Result<PathBuf, DecodeError> {
        self.record("audio");
        tokio::fs::write(output, b"RIFF").await?;
        Ok(output.to_path_buf())
    }

    async fn extract_frames(
        &self,
        _video: &Path,
        output_dir: &Path,
        _fps: f64,
    ) -> Result<Vec<PathBuf>, DecodeError> {
        self.record("frames");
        let mut paths = Vec::new();
        for ordinal in 1..=self.script.frame_count {
            let path = output_dir.join(frame_name(ordinal));
            tokio::fs::write(&path, b"jpeg").await?;
            paths.push(path);
        }
        Ok(paths)
    }
}

#[async_trait]
impl Transcriber for FakeWorld {
    async fn transcribe(&self, _audio: &Path) -> Result<Transcription, InferenceError> {
        self.record("transcribe");
        if self.script.fail_transcription {
            return Err(InferenceError::ApiError(502, "upstream unavailable".to_string()));
        }
        Ok(Transcription {
            text: "Hello there. Look at this dog.".to_string(),
            language: "english".to_string(),
            segments: vec![
                TranscriptSegment {
                    id: 0,
                    start: 0.0,
                    end: 1.5,
                    text: "Hello there.".to_string(),
                },
                TranscriptSegment {
                    id: 1,
                    start: 1.5,
                    end: 4.0,
                    text: "Look at this dog.".to_string(),
                },
            ],
        })
    }
}

#[async_trait]
impl ObjectDetector for FakeWorld {
    async fn detect(&self, frame: &Path) -> Result<Vec<FrameDetection>, InferenceError> {
        let name = frame
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.record(format!("detect:{}", name));

        if self.script.fail_detection {
            return Err(InferenceError::NetworkError("connection reset".to_string()));
        }
        Ok(vec![FrameDetection {
            name: "Dog".to_string(),
            confidence: 0.9,
            context: format!("dog in {}", name),
        }])
    }
}

#[async_trait]
impl SentimentAnalyzer for FakeWorld {
    async fn summarize(&self, _full_text: &str) -> Result<SentimentResult, InferenceError> {
        self.record("summarize");
        Ok(SentimentResult {
            overall_sentiment: Sentiment::Positive,
            mood_keywords: vec!["friendly".to_string()],
            confidence: 0.8,
            short_summary: "Someone greets the viewer and shows a dog.".to_string(),
        })
    }

    /// Only segment 0 gets a record
    async fn batch_segments(
        &self,
        _segments: &[TranscriptSegment],
    ) -> Result<Vec<SegmentSentimentRecord>, InferenceError> {
        self.record("batch");
        Ok(vec![SegmentSentimentRecord {
            segment_id: 0,
            sentiment: Sentiment::Positive,
            mood_keywords: vec!["warm".to_string()],
        }])
    }
}

#[async_trait]
impl QaGenerator for FakeWorld {
    async fn generate_qa(
        &self,
        _full_text: &str,
        desired_count: usize,
        _segments: Option<&[TranscriptSegment]>,
    ) -> Result<Vec<QaPair>, InferenceError> {
        self.record(format!("qa:{}", desired_count));
        if self.script.fail_qa {
            return Err(InferenceError::ParseError("QA response contained no usable pairs".to_string()));
        }
        Ok(vec![QaPair {
            question: "What animal appears?".to_string(),
            answer: "A dog.".to_string(),
            relevant_snippets: vec![Snippet {
                segment_id: 1,
                text: "Look at this dog.".to_string(),
            }],
        }])
    }
}

/// Provider handing out the same [`FakeWorld`] for every credential
pub struct FakeProvider {
    pub world: Arc<FakeWorld>,
    credentials: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            world: Arc::new(FakeWorld::new(script)),
            credentials: Mutex::new(Vec::new()),
        })
    }

    /// Credentials collaborators were built for
    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

impl CollaboratorProvider for FakeProvider {
    fn for_credential(&self, api_key: &str) -> Collaborators {
        self.credentials.lock().unwrap().push(api_key.to_string());
        Collaborators {
            decoder: self.world.clone(),
            transcriber: self.world.clone(),
            detector: self.world.clone(),
            sentiment: self.world.clone(),
            qa: self.world.clone(),
        }
    }
}

/// Configuration rooted in `dir`, no demo delays, directories created
pub fn test_config(dir: &TempDir) -> ServiceConfig {
    let config = ServiceConfig {
        data_dir: dir.path().to_path_buf(),
        demo_step_delay_ms: 0,
        expose_error_details: true,
        ..Default::default()
    };
    config.ensure_directories().unwrap();
    config
}

pub fn test_app_state(dir: &TempDir, provider: Arc<FakeProvider>) -> AppState {
    AppState::new(test_config(dir), provider)
}

/// Write an upload into `uploads/` as the HTTP layer would
pub fn stage_upload(config: &ServiceConfig, original_name: &str) -> UploadedMedia {
    let path = config
        .uploads_dir()
        .join(format!("{}.mp4", uuid::Uuid::new_v4()));
    let bytes = b"\x00\x00\x00\x18ftypmp42 fake video payload";
    std::fs::write(&path, bytes).unwrap();

    UploadedMedia {
        path,
        original_name: original_name.to_string(),
        content_type: Some("video/mp4".to_string()),
        size_bytes: bytes.len() as u64,
    }
}

pub fn request(media: UploadedMedia, credential: &str, session_id: Option<&str>) -> AnalysisRequest {
    AnalysisRequest {
        media: Some(media),
        credential: credential.to_string(),
        session_id: session_id.map(str::to_string),
        demo: false,
    }
}

/// Entries left in a directory
pub fn dir_entries(path: &Path) -> usize {
    std::fs::read_dir(path).map(|d| d.count()).unwrap_or(0)
}
