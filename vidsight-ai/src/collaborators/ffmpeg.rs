//! ffmpeg/ffprobe media decoder
//!
//! Wraps the ffmpeg command-line tools for duration probing, audio extraction and
//! frame sampling. Frames are written as `frame_0001.jpg`, `frame_0002.jpg`, ...

use super::MediaDecoder;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;

/// Media decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Tool binary not found in PATH
    #[error("{0} binary not found in PATH")]
    BinaryNotFound(String),

    /// Failed to execute the tool
    #[error("Failed to execute {tool}: {message}")]
    ExecutionError { tool: String, message: String },

    /// Tool ran but rejected the input
    #[error("{tool} failed (exit code {code:?}): {stderr}")]
    DecodeFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Unparsable tool output
    #[error("Failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// I/O error (output directory listing)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSION: &str = "jpg";

/// ffmpeg-backed [`MediaDecoder`]
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegDecoder {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Check that both binaries can be executed
    pub async fn is_available(&self) -> bool {
        for binary in [&self.ffmpeg_path, &self.ffprobe_path] {
            if Command::new(binary).arg("-version").output().await.is_err() {
                return false;
            }
        }
        true
    }

    async fn execute(&self, mut command: Command, tool: &str) -> Result<Output, DecodeError> {
        tracing::debug!(tool = %tool, command = ?command.as_std(), "Running media tool");

        let output = command
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DecodeError::BinaryNotFound(tool.to_string())
                } else {
                    DecodeError::ExecutionError {
                        tool: tool.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecodeError::DecodeFailed {
                tool: tool.to_string(),
                code: output.status.code(),
                stderr: last_lines(&stderr, 5),
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaDecoder for FfmpegDecoder {
    async fn probe_duration(&self, video: &Path) -> Result<f64, DecodeError> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(video);
        let output = self.execute(command, &self.ffprobe_path).await?;

        parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            DecodeError::ParseError {
                tool: self.ffprobe_path.clone(),
                message: "missing or invalid duration".to_string(),
            }
        })
    }

    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<PathBuf, DecodeError> {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-y", "-i"])
            .arg(video)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(output);
        self.execute(command, &self.ffmpeg_path).await?;

        Ok(output.to_path_buf())
    }

    async fn extract_frames(
        &self,
        video: &Path,
        output_dir: &Path,
        fps: f64,
    ) -> Result<Vec<PathBuf>, DecodeError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let filter = format!("fps={}", fps);
        let pattern = output_dir.join(format!("{}%04d.{}", FRAME_PREFIX, FRAME_EXTENSION));

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(["-y", "-i"])
            .arg(video)
            .args(["-vf", filter.as_str()])
            .arg(&pattern);
        self.execute(command, &self.ffmpeg_path).await?;

        list_frames(output_dir).await
    }
}

/// Parse ffprobe's bare duration output
fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Frame ordinal from a `frame_NNNN.jpg` filename
fn frame_ordinal(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != FRAME_EXTENSION {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(FRAME_PREFIX)?
        .parse()
        .ok()
}

/// Frame images in `dir`, sorted by ordinal
async fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, DecodeError> {
    let mut frames = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(ordinal) = frame_ordinal(&path) {
            frames.push((ordinal, path));
        }
    }

    frames.sort_by_key(|(ordinal, _)| *ordinal);
    Ok(frames.into_iter().map(|(_, path)| path).collect())
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.345000\n"), Some(12.345));
        assert_eq!(parse_duration("\n  8\n"), Some(8.0));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_frame_ordinal() {
        assert_eq!(frame_ordinal(Path::new("/w/frames/frame_0007.jpg")), Some(7));
        assert_eq!(frame_ordinal(Path::new("/w/frames/frame_0007.png")), None);
        assert_eq!(frame_ordinal(Path::new("/w/frames/thumb_0007.jpg")), None);
    }

    #[tokio::test]
    async fn test_list_frames_sorted_by_ordinal() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_0010.jpg", "frame_0002.jpg", "frame_0001.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let frames = list_frames(dir.path()).await.unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["frame_0001.jpg", "frame_0002.jpg", "frame_0010.jpg"]);
    }

    #[tokio::test]
    async fn test_missing_binary_reported() {
        let decoder = FfmpegDecoder::new("vidsight-no-such-ffmpeg", "vidsight-no-such-ffprobe");
        let result = decoder.probe_duration(Path::new("/tmp/x.mp4")).await;
        assert!(matches!(result, Err(DecodeError::BinaryNotFound(_))));
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("a\nb\nc", 2), "b\nc");
        assert_eq!(last_lines("a", 5), "a");
    }
}
