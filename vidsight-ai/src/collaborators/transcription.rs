//! Speech-to-text via the audio transcriptions endpoint

use super::{InferenceError, OpenAiClient, Transcriber};
use crate::models::{TranscriptSegment, Transcription};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;

/// `verbose_json` response (fields we use)
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    id: u32,
    start: f64,
    end: f64,
    text: String,
}

impl From<VerboseTranscription> for Transcription {
    fn from(raw: VerboseTranscription) -> Self {
        Transcription {
            text: raw.text.trim().to_string(),
            language: raw.language.unwrap_or_else(|| "unknown".to_string()),
            segments: raw
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    id: s.id,
                    start: s.start,
                    end: s.end,
                    text: s.text.trim().to_string(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: &Path) -> Result<Transcription, InferenceError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| InferenceError::InvalidInput(format!("{}: {}", audio.display(), e)))?;

        tracing::info!(audio_bytes = bytes.len(), "Transcribing audio");

        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| InferenceError::InvalidInput(e.to_string()))?;

        let form = multipart::Form::new()
            .text("model", self.models.transcription.clone())
            .text("response_format", "verbose_json")
            .part("file", file_part);

        let body = self
            .send_json(self.http.post(self.url("audio/transcriptions")).multipart(form))
            .await?;

        let raw: VerboseTranscription =
            serde_json::from_value(body).map_err(|e| InferenceError::ParseError(e.to_string()))?;

        Ok(raw.into())
    }
}
