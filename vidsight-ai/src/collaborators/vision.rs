//! Per-frame object detection via a vision-capable chat model

use super::{InferenceError, ObjectDetector, OpenAiClient};
use crate::models::FrameDetection;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

const DETECTION_PROMPT: &str = "You are an object detector. List the distinct, clearly visible \
objects in the image. Respond with a JSON object of the form \
{\"objects\": [{\"name\": string, \"confidence\": number between 0 and 1, \
\"context\": short description of where or how the object appears}]}. \
Use short singular common nouns for names.";

#[derive(Debug, Deserialize)]
struct DetectionResponse {
    #[serde(default)]
    objects: Vec<RawDetection>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    #[serde(default)]
    name: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    context: Option<String>,
}

/// Drop nameless entries and clamp confidences into [0, 1]
fn normalize_detections(value: Value) -> Result<Vec<FrameDetection>, InferenceError> {
    let response: DetectionResponse =
        serde_json::from_value(value).map_err(|e| InferenceError::ParseError(e.to_string()))?;

    Ok(response
        .objects
        .into_iter()
        .filter(|d| !d.name.trim().is_empty())
        .map(|d| FrameDetection {
            name: d.name.trim().to_string(),
            confidence: d
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(0.0)
                .clamp(0.0, 1.0),
            context: d.context.unwrap_or_default(),
        })
        .collect())
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[async_trait]
impl ObjectDetector for OpenAiClient {
    async fn detect(&self, frame: &Path) -> Result<Vec<FrameDetection>, InferenceError> {
        let bytes = tokio::fs::read(frame)
            .await
            .map_err(|e| InferenceError::InvalidInput(format!("{}: {}", frame.display(), e)))?;

        let data_url = format!(
            "data:{};base64,{}",
            image_mime(frame),
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );

        let content = json!([
            { "type": "text", "text": "Detect the objects in this video frame." },
            { "type": "image_url", "image_url": { "url": data_url, "detail": "low" } },
        ]);

        let value = self
            .chat_json(&self.models.vision, DETECTION_PROMPT, content)
            .await?;

        let detections = normalize_detections(value)?;
        tracing::debug!(frame = %frame.display(), count = detections.len(), "Frame analyzed");
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_detections() {
        let detections = normalize_detections(json!({
            "objects": [
                {"name": " Laptop ", "confidence": 0.93, "context": "on the desk"},
                {"name": "", "confidence": 0.5},
                {"name": "mug", "confidence": 1.7},
                {"name": "lamp"}
            ]
        }))
        .unwrap();

        assert_eq!(detections.len(), 3);
        assert_eq!(detections[0].name, "Laptop");
        assert_eq!(detections[0].context, "on the desk");
        assert_eq!(detections[1].confidence, 1.0);
        assert_eq!(detections[2].confidence, 0.0);
        assert_eq!(detections[2].context, "");
    }

    #[test]
    fn test_missing_objects_key_is_empty() {
        assert!(normalize_detections(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("frame_0001.jpg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("frame_0001.PNG")), "image/png");
    }
}
