//! Stage 6: OBJECT_DETECTION
//!
//! Never fails: detection errors only cost the affected frames.

use super::AnalysisOrchestrator;
use crate::collaborators::Collaborators;
use crate::models::{AnalysisSession, DetectedObjectSummary, ExtractedFrame, Stage};
use crate::services::object_aggregator::{sampling_stride, ObjectAggregator};

impl AnalysisOrchestrator {
    pub(super) async fn stage_object_detection(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        frames: &[ExtractedFrame],
    ) -> Vec<DetectedObjectSummary> {
        self.enter_stage(session, Stage::ObjectDetection);

        let stride = sampling_stride(frames.len());
        let aggregator =
            ObjectAggregator::new(collaborators.detector.clone(), self.config.detection_concurrency);
        let objects = aggregator
            .aggregate(frames, stride, self.config.frames_per_second)
            .await;

        self.complete_stage(
            session,
            Stage::ObjectDetection,
            Some(format!("{} objects", objects.len())),
        );
        objects
    }
}
