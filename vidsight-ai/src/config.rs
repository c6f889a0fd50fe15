//! Service configuration for vidsight-ai
//!
//! Resolved from an optional TOML file (CLI → ENV → platform config dir), with
//! built-in defaults for every field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use vidsight_common::{Error, Result};

/// Environment variable naming the TOML configuration file
pub const CONFIG_ENV_VAR: &str = "VIDSIGHT_CONFIG";

const APP_NAME: &str = "vidsight";
const MIB: u64 = 1024 * 1024;

/// vidsight-ai configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Root for `uploads/` and `work/`
    pub data_dir: PathBuf,
    /// Upload size limit (bytes)
    pub max_upload_bytes: u64,
    /// Accepted upload MIME types
    pub accepted_mime_types: Vec<String>,
    /// Accepted upload filename extensions (lower-case, no dot)
    pub accepted_extensions: Vec<String>,
    /// Frame extraction rate
    pub frames_per_second: f64,
    /// Maximum in-flight detection calls per request
    pub detection_concurrency: usize,
    /// Delay between synthetic demo progress events (ms)
    pub demo_step_delay_ms: u64,
    /// Number of QA pairs requested
    pub qa_pair_count: usize,
    /// Include stage failure detail in error responses
    pub expose_error_details: bool,
    pub openai_base_url: String,
    pub transcription_model: String,
    pub vision_model: String,
    pub text_model: String,
    /// Collaborator HTTP timeout (seconds)
    pub http_timeout_secs: u64,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: vidsight_common::config::default_data_dir(APP_NAME),
            max_upload_bytes: 100 * MIB,
            accepted_mime_types: vec!["video/mp4".to_string()],
            accepted_extensions: vec!["mp4".to_string()],
            frames_per_second: 1.0,
            detection_concurrency: 4,
            demo_step_delay_ms: 800,
            qa_pair_count: 5,
            expose_error_details: true,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            transcription_model: "whisper-1".to_string(),
            vision_model: "gpt-4o-mini".to_string(),
            text_model: "gpt-4o-mini".to_string(),
            http_timeout_secs: 120,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve, load and validate configuration
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = vidsight_common::config::resolve_config_path(cli_path, CONFIG_ENV_VAR, APP_NAME);
        let config: ServiceConfig = vidsight_common::config::load_toml(path.as_deref())?;
        config.validate()?;

        info!(
            data_dir = %config.data_dir.display(),
            max_upload_mb = config.max_upload_bytes / MIB,
            fps = config.frames_per_second,
            detection_concurrency = config.detection_concurrency,
            "Service configuration resolved"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frames_per_second.is_nan() || self.frames_per_second <= 0.0 {
            return Err(Error::Config(format!(
                "frames_per_second must be positive, got {}",
                self.frames_per_second
            )));
        }
        if self.detection_concurrency == 0 {
            return Err(Error::Config("detection_concurrency must be at least 1".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }
        if self.accepted_mime_types.is_empty() && self.accepted_extensions.is_empty() {
            return Err(Error::Config(
                "at least one accepted MIME type or extension is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory holding stored uploads
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Directory holding per-request working directories
    pub fn work_dir(&self) -> PathBuf {
        self.data_dir.join("work")
    }

    /// Create `uploads/` and `work/` if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(self.uploads_dir())?;
        std::fs::create_dir_all(self.work_dir())?;
        Ok(())
    }
}
