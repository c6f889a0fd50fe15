//! OpenAI-compatible inference client
//!
//! One [`OpenAiClient`] per request carries the caller's API key; the underlying
//! `reqwest::Client` (connection pool) is shared across requests by [`OpenAiProvider`].

use super::{CollaboratorProvider, Collaborators, FfmpegDecoder};
use crate::config::ServiceConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("vidsight-ai/", env!("CARGO_PKG_VERSION"));

/// Inference service errors
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Input could not be prepared for the request (e.g. unreadable file)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Model selection for each service
#[derive(Debug, Clone)]
pub(crate) struct ModelSet {
    pub transcription: String,
    pub vision: String,
    pub text: String,
}

/// OpenAI-compatible API client bound to one API key
#[derive(Clone)]
pub struct OpenAiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) models: Arc<ModelSet>,
}

impl OpenAiClient {
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Send a request and return the JSON body, mapping HTTP failures
    pub(crate) async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, InferenceError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| InferenceError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| InferenceError::ParseError(e.to_string()))
    }

    /// Chat completion constrained to a JSON object; returns the parsed object
    pub(crate) async fn chat_json(
        &self,
        model: &str,
        system_prompt: &str,
        user_content: Value,
    ) -> Result<Value, InferenceError> {
        let body = json!({
            "model": model,
            "response_format": { "type": "json_object" },
            "temperature": 0.2,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_content },
            ],
        });

        tracing::debug!(model = %model, "Requesting chat completion");

        let response = self
            .send_json(self.http.post(self.url("chat/completions")).json(&body))
            .await?;

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| InferenceError::ParseError("completion has no message content".into()))?;

        serde_json::from_str(content).map_err(|e| InferenceError::ParseError(e.to_string()))
    }
}

/// Production [`CollaboratorProvider`]: ffmpeg + OpenAI-compatible API
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    models: Arc<ModelSet>,
    decoder: Arc<FfmpegDecoder>,
}

impl OpenAiProvider {
    pub fn new(config: &ServiceConfig) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| InferenceError::NetworkError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.openai_base_url.clone(),
            models: Arc::new(ModelSet {
                transcription: config.transcription_model.clone(),
                vision: config.vision_model.clone(),
                text: config.text_model.clone(),
            }),
            decoder: Arc::new(FfmpegDecoder::new(
                config.ffmpeg_path.clone(),
                config.ffprobe_path.clone(),
            )),
        })
    }
}

impl CollaboratorProvider for OpenAiProvider {
    fn for_credential(&self, api_key: &str) -> Collaborators {
        let client = Arc::new(OpenAiClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
            models: self.models.clone(),
        });

        Collaborators {
            decoder: self.decoder.clone(),
            transcriber: client.clone(),
            detector: client.clone(),
            sentiment: client.clone(),
            qa: client,
        }
    }
}
