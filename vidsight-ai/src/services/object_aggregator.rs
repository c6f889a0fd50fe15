//! Object aggregation engine
//!
//! Samples the extracted frame sequence, runs detection on each sampled frame and
//! folds the per-frame detections into per-object statistics.
//!
//! # Sampling
//! Stride 1 when the video yields at most [`FULL_SAMPLING_MAX_FRAMES`] frames, stride 2
//! otherwise. Sampled ordinals are `1, 1+stride, 1+2·stride, …`.
//!
//! # Statistics
//! - `appearance_percentage = round(frames / N × 100, 1)` with N the full (unsampled) frame count
//! - `avg_confidence = round(mean(confidences), 2)`
//! - confidences are clamped to `[0, 1]`
//! - each object counts at most once per frame; repeated detections of it in that
//!   frame contribute their mean confidence and the best detection's context
//!
//! # Ordering
//! Rounded `appearance_percentage` descending, then first appearance (`frame_id`)
//! ascending, then name ascending.
//!
//! A failed detection call only loses that frame's detections.

use crate::collaborators::ObjectDetector;
use crate::models::{DetectedObjectFrame, DetectedObjectSummary, ExtractedFrame, FrameDetection};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;

/// Largest frame count still sampled at stride 1
pub const FULL_SAMPLING_MAX_FRAMES: usize = 30;

/// Sampling stride for a video with `total_frames` extracted frames
pub fn sampling_stride(total_frames: usize) -> usize {
    if total_frames <= FULL_SAMPLING_MAX_FRAMES {
        1
    } else {
        2
    }
}

/// Frames submitted for detection: every `stride`-th frame starting with the first
pub fn sample_frames(frames: &[ExtractedFrame], stride: usize) -> Vec<&ExtractedFrame> {
    frames.iter().step_by(stride.max(1)).collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Case-insensitive object identity
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Per-object accumulator
struct ObjectGroup {
    name: String,
    frames: Vec<DetectedObjectFrame>,
}

/// Repeated detections of one object within a single frame
struct FrameHits {
    best: FrameDetection,
    confidence_sum: f64,
    hits: usize,
}

impl FrameHits {
    fn new(detection: FrameDetection) -> Self {
        Self {
            confidence_sum: detection.confidence,
            hits: 1,
            best: detection,
        }
    }

    fn add(&mut self, detection: FrameDetection) {
        self.confidence_sum += detection.confidence;
        self.hits += 1;
        if detection.confidence > self.best.confidence {
            self.best = detection;
        }
    }

    fn mean_confidence(&self) -> f64 {
        self.confidence_sum / self.hits as f64
    }
}

fn first_frame(summary: &DetectedObjectSummary) -> u32 {
    summary.frames.first().map(|f| f.frame_id).unwrap_or(u32::MAX)
}

impl ObjectGroup {
    fn into_summary(self, total_frames: usize) -> DetectedObjectSummary {
        let count = self.frames.len() as f64;
        let confidence_sum: f64 = self.frames.iter().map(|f| f.confidence).sum();

        DetectedObjectSummary {
            name: self.name,
            appearance_percentage: round_to(count / total_frames as f64 * 100.0, 1),
            avg_confidence: round_to(confidence_sum / count, 2),
            frames: self.frames,
        }
    }
}

/// Fold per-frame detections into ordered object summaries
///
/// `detections` pairs a frame ordinal with that frame's detections; it may arrive in
/// any order. `total_frames` is the full extracted frame count.
pub fn summarize_detections(
    mut detections: Vec<(u32, Vec<FrameDetection>)>,
    total_frames: usize,
    frames_per_second: f64,
) -> Vec<DetectedObjectSummary> {
    if total_frames == 0 {
        return Vec::new();
    }

    detections.sort_by_key(|(ordinal, _)| *ordinal);

    let mut groups: Vec<ObjectGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (ordinal, frame_detections) in detections {
        // One entry per object per frame
        let mut in_frame: Vec<(String, FrameHits)> = Vec::new();
        for mut detection in frame_detections {
            let key = normalize_name(&detection.name);
            if key.is_empty() {
                continue;
            }
            detection.confidence = detection.confidence.clamp(0.0, 1.0);
            match in_frame.iter_mut().find(|(k, _)| *k == key) {
                Some((_, hits)) => hits.add(detection),
                None => in_frame.push((key, FrameHits::new(detection))),
            }
        }

        for (key, hits) in in_frame {
            let confidence = hits.mean_confidence();
            let slot = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(ObjectGroup {
                    name: key,
                    frames: Vec::new(),
                });
                groups.len() - 1
            });

            groups[slot].frames.push(DetectedObjectFrame {
                frame_id: ordinal,
                timestamp: (ordinal.saturating_sub(1)) as f64 / frames_per_second,
                confidence,
                context: hits.best.context,
            });
        }
    }

    let mut summaries: Vec<DetectedObjectSummary> = groups
        .into_iter()
        .map(|group| group.into_summary(total_frames))
        .collect();

    // Distinct counts can round to the same percentage, so order on the rounded value
    summaries.sort_by(|a, b| {
        b.appearance_percentage
            .total_cmp(&a.appearance_percentage)
            .then_with(|| first_frame(a).cmp(&first_frame(b)))
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

/// Runs detection over sampled frames and aggregates the results
pub struct ObjectAggregator {
    detector: Arc<dyn ObjectDetector>,
    concurrency: usize,
}

impl ObjectAggregator {
    /// `concurrency` bounds the number of in-flight detection calls
    pub fn new(detector: Arc<dyn ObjectDetector>, concurrency: usize) -> Self {
        Self {
            detector,
            concurrency: concurrency.max(1),
        }
    }

    /// Detect and aggregate objects across `frames`
    pub async fn aggregate(
        &self,
        frames: &[ExtractedFrame],
        stride: usize,
        frames_per_second: f64,
    ) -> Vec<DetectedObjectSummary> {
        let sampled: Vec<ExtractedFrame> =
            sample_frames(frames, stride).into_iter().cloned().collect();

        tracing::info!(
            total_frames = frames.len(),
            sampled_frames = sampled.len(),
            stride,
            concurrency = self.concurrency,
            "Running object detection"
        );

        let detections: Vec<(u32, Vec<FrameDetection>)> = stream::iter(sampled)
            .map(|frame| {
                let detector = self.detector.clone();
                async move {
                    match detector.detect(&frame.path).await {
                        Ok(found) => (frame.ordinal, found),
                        Err(e) => {
                            tracing::warn!(
                                frame_id = frame.ordinal,
                                frame = %frame.path.display(),
                                error = %e,
                                "Frame detection failed, treating as no detections"
                            );
                            (frame.ordinal, Vec::new())
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let summaries = summarize_detections(detections, frames.len(), frames_per_second);

        tracing::info!(objects = summaries.len(), "Object aggregation complete");
        summaries
    }
}
