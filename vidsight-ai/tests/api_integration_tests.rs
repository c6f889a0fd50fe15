//! HTTP API integration tests
//!
//! Drives the router with `oneshot` requests: health, multipart analysis uploads
//! and the progress stream route.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use helpers::{test_app_state, FakeProvider, Script, TEST_API_KEY};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use vidsight_ai::{build_router, AppState};

const BOUNDARY: &str = "vidsight-test-boundary";

/// Multipart form builder
struct Form {
    body: Vec<u8>,
}

impl Form {
    fn new() -> Self {
        Self { body: Vec::new() }
    }

    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn into_request(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

const VIDEO: &[u8] = b"\x00\x00\x00\x18ftypmp42 not really a video";

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_app_state(&dir, FakeProvider::new(Script::default())));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "vidsight-ai");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["active_sessions"], 0);
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_demo_analysis_over_http() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Script::default());
    let state = test_app_state(&dir, provider.clone());
    let uploads = state.config.uploads_dir();
    let app = build_router(state);

    let request = Form::new()
        .file("video", "beach.mp4", "video/mp4", VIDEO)
        .text("apiKey", "demo")
        .text("sessionId", "http-demo")
        .into_request();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["sessionId"], "http-demo");
    assert_eq!(json["metadata"]["videoFile"], "beach.mp4");
    assert_eq!(json["metadata"]["demoMode"], true);
    assert!(json["metadata"]["processedAt"].is_string());
    assert!(json["metadata"]["processingTime"].is_number());
    assert_eq!(json["transcript"]["segments"].as_array().unwrap().len(), 4);
    assert!(json["transcript"]["full_text"].is_string());
    assert!(json["sentiment"]["overall_sentiment"].is_string());
    assert!(json["objects_detected"].is_array());
    assert!(json["qa_pairs"][0]["relevantSnippets"].is_array());

    assert!(provider.credentials().is_empty());
    assert_eq!(helpers::dir_entries(&uploads), 0);
}

#[tokio::test]
async fn test_pipeline_analysis_over_http() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Script {
        frame_count: 2,
        ..Default::default()
    });
    let app = build_router(test_app_state(&dir, provider.clone()));

    let request = Form::new()
        .text("apiKey", TEST_API_KEY)
        .file("video", "dog.mp4", "video/mp4", VIDEO)
        .into_request();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json.get("metadata").unwrap().get("demoMode").is_none());
    assert_eq!(json["objects_detected"][0]["name"], "dog");
    assert_eq!(json["transcript"]["segments"][1]["sentiment"], "neutral");
    assert_eq!(provider.credentials(), vec![TEST_API_KEY.to_string()]);
}

#[tokio::test]
async fn test_missing_video_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = build_router(test_app_state(&dir, FakeProvider::new(Script::default())));

    let request = Form::new().text("apiKey", TEST_API_KEY).into_request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("No video"));
}

#[tokio::test]
async fn test_wrong_media_type_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let state = test_app_state(&dir, FakeProvider::new(Script::default()));
    let uploads = state.config.uploads_dir();
    let app = build_router(state);

    let request = Form::new()
        .file("video", "clip.mov", "video/quicktime", VIDEO)
        .text("apiKey", TEST_API_KEY)
        .into_request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(helpers::dir_entries(&uploads), 0);
}

#[tokio::test]
async fn test_invalid_api_key_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Script::default());
    let app = build_router(test_app_state(&dir, provider.clone()));

    let request = Form::new()
        .file("video", "clip.mp4", "video/mp4", VIDEO)
        .text("apiKey", "letmein")
        .into_request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json.get("details").is_none());
    assert!(provider.credentials().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = helpers::test_config(&dir);
    config.max_upload_bytes = 8;
    let state = AppState::new(config, FakeProvider::new(Script::default()));
    let uploads = state.config.uploads_dir();
    let app = build_router(state);

    let request = Form::new()
        .file("video", "big.mp4", "video/mp4", VIDEO)
        .text("apiKey", "demo")
        .into_request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(helpers::dir_entries(&uploads), 0);
}

#[tokio::test]
async fn test_stage_failure_is_internal_error_with_details() {
    let dir = TempDir::new().unwrap();
    let provider = FakeProvider::new(Script {
        fail_probe: true,
        ..Default::default()
    });
    let app = build_router(test_app_state(&dir, provider));

    let request = Form::new()
        .file("video", "corrupt.mp4", "video/mp4", VIDEO)
        .text("apiKey", TEST_API_KEY)
        .into_request();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Video processing failed");
    assert!(json["details"].as_str().unwrap().contains("moov atom not found"));
}

#[tokio::test]
async fn test_progress_route_streams_events() {
    let dir = TempDir::new().unwrap();
    let state = test_app_state(&dir, FakeProvider::new(Script::default()));
    let sessions = state.sessions.clone();
    let app = build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/progress/abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().contains("text/event-stream"));
    assert!(sessions.is_subscribed("abc-123"));

    // Closing the channel ends the stream after the connected event
    sessions.unsubscribe("abc-123");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: connected"));
    assert!(text.contains(r#"{"type":"connected"}"#));
}
