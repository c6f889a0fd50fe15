//! Analysis request models

use std::path::PathBuf;

/// Video payload already written to disk by the upload handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    /// Stored upload (removed when the request finishes)
    pub path: PathBuf,
    /// Filename as supplied by the client
    pub original_name: String,
    /// MIME type as declared by the client
    pub content_type: Option<String>,
    pub size_bytes: u64,
}

/// One processing request
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub media: Option<UploadedMedia>,
    /// API key, or a demo sentinel
    pub credential: String,
    /// Caller-supplied session id; generated when absent
    pub session_id: Option<String>,
    /// Explicit demo request
    pub demo: bool,
}
