//! Request validation
//!
//! Runs before any stage: media presence, media type, size limit and credential
//! shape. Nothing is contacted here; the credential is only checked for shape.

use crate::config::ServiceConfig;
use crate::error::AnalysisError;
use crate::models::{AnalysisRequest, UploadedMedia};
use std::path::Path;

/// Credentials that select demo mode (case-sensitive)
pub const DEMO_SENTINELS: [&str; 2] = ["demo", "demo-key"];

/// Prefix every real API key carries
pub const API_KEY_PREFIX: &str = "sk-";

/// How the request will be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Canned result, no collaborators
    Demo,
    /// Full pipeline with the caller's API key
    Pipeline,
}

pub fn is_demo_sentinel(credential: &str) -> bool {
    DEMO_SENTINELS.contains(&credential)
}

/// `sk-` followed by at least one character, no whitespace anywhere
pub fn is_api_key_shape(credential: &str) -> bool {
    credential.len() > API_KEY_PREFIX.len()
        && credential.starts_with(API_KEY_PREFIX)
        && !credential.chars().any(char::is_whitespace)
}

/// MIME essence without parameters, lower-cased
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Accepted when either the declared MIME type or the filename extension matches
fn is_accepted_media(media: &UploadedMedia, config: &ServiceConfig) -> bool {
    let mime_ok = media
        .content_type
        .as_deref()
        .map(mime_essence)
        .is_some_and(|mime| config.accepted_mime_types.iter().any(|m| m.eq_ignore_ascii_case(&mime)));

    let ext_ok = extension(&media.original_name)
        .is_some_and(|ext| config.accepted_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)));

    mime_ok || ext_ok
}

/// Validate a request and decide how it runs
pub fn validate_request(
    request: &AnalysisRequest,
    config: &ServiceConfig,
) -> Result<ExecutionMode, AnalysisError> {
    let media = request
        .media
        .as_ref()
        .ok_or_else(|| AnalysisError::InputValidation("No video file provided".to_string()))?;

    if media.size_bytes == 0 {
        return Err(AnalysisError::InputValidation("Uploaded video is empty".to_string()));
    }

    if media.size_bytes > config.max_upload_bytes {
        return Err(AnalysisError::PayloadTooLarge {
            limit_bytes: config.max_upload_bytes,
        });
    }

    if !is_accepted_media(media, config) {
        return Err(AnalysisError::InputValidation(format!(
            "Unsupported video format for '{}' ({}); accepted: {}",
            media.original_name,
            media.content_type.as_deref().unwrap_or("no content type"),
            config.accepted_mime_types.join(", ")
        )));
    }

    let credential = request.credential.as_str();
    if is_demo_sentinel(credential) {
        return Ok(ExecutionMode::Demo);
    }
    if !is_api_key_shape(credential) {
        return Err(AnalysisError::InputValidation(
            "Invalid API key format. Use an 'sk-' key, or 'demo' for demo mode".to_string(),
        ));
    }

    if request.demo {
        Ok(ExecutionMode::Demo)
    } else {
        Ok(ExecutionMode::Pipeline)
    }
}
