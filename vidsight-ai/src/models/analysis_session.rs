//! Analysis stage state machine
//!
//! VALIDATING → (DEMO | PROBING → AUDIO_EXTRACTION → FRAME_EXTRACTION → TRANSCRIPTION →
//! SEGMENT_SENTIMENT → OBJECT_DETECTION → OVERALL_SENTIMENT → QA_GENERATION → ASSEMBLING)
//! → COMPLETED
//!
//! Any non-terminal stage may move to FAILED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Analysis stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Upload, media type and credential checks
    Validating,
    /// Canned result, no collaborators contacted
    Demo,
    /// Duration probe
    Probing,
    /// Mono PCM audio track extraction
    AudioExtraction,
    /// Fixed-rate frame sampling to images
    FrameExtraction,
    /// Speech to text
    Transcription,
    /// Batch per-segment sentiment
    SegmentSentiment,
    /// Per-frame detection and aggregation
    ObjectDetection,
    /// Whole-transcript sentiment and summary
    OverallSentiment,
    /// Question/answer generation
    QaGeneration,
    /// Result assembly
    Assembling,
    Completed,
    Failed,
}

/// Progress milestones for one pipeline stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageMilestone {
    pub step_index: u32,
    pub start_message: &'static str,
    pub completion_message: &'static str,
    pub start_percentage: f64,
    pub completion_percentage: f64,
}

impl Stage {
    /// Pipeline stages in execution order
    pub const PIPELINE: [Stage; 9] = [
        Stage::Probing,
        Stage::AudioExtraction,
        Stage::FrameExtraction,
        Stage::Transcription,
        Stage::SegmentSentiment,
        Stage::ObjectDetection,
        Stage::OverallSentiment,
        Stage::QaGeneration,
        Stage::Assembling,
    ];

    /// Progress milestones, `None` for stages that emit no progress
    pub fn milestone(self) -> Option<StageMilestone> {
        let (step_index, start_message, completion_message, start, done) = match self {
            Stage::Probing => (1, "Analyzing video file...", "Video duration determined", 0.0, 5.0),
            Stage::AudioExtraction => (2, "Extracting audio track...", "Audio extracted", 5.0, 10.0),
            Stage::FrameExtraction => (3, "Extracting video frames...", "Frames extracted", 10.0, 20.0),
            Stage::Transcription => (4, "Transcribing audio...", "Transcription complete", 20.0, 40.0),
            Stage::SegmentSentiment => (5, "Analyzing segment sentiment...", "Segment sentiment analyzed", 40.0, 50.0),
            Stage::ObjectDetection => (6, "Detecting objects in frames...", "Object detection complete", 50.0, 75.0),
            Stage::OverallSentiment => (7, "Analyzing overall sentiment...", "Sentiment analysis complete", 75.0, 85.0),
            Stage::QaGeneration => (8, "Generating questions and answers...", "Questions generated", 85.0, 95.0),
            Stage::Assembling => (9, "Assembling results...", "Analysis complete", 95.0, 100.0),
            _ => return None,
        };

        Some(StageMilestone {
            step_index,
            start_message,
            completion_message,
            start_percentage: start,
            completion_percentage: done,
        })
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: Stage) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Stage::Failed {
            return true;
        }

        match self {
            Stage::Validating => matches!(next, Stage::Demo | Stage::Probing),
            Stage::Demo | Stage::Assembling => next == Stage::Completed,
            _ => {
                let pos = Stage::PIPELINE.iter().position(|s| *s == self);
                pos.and_then(|p| Stage::PIPELINE.get(p + 1)) == Some(&next)
            }
        }
    }
}

/// Stage transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub session_id: String,
    pub old_stage: Stage,
    pub new_stage: Stage,
    pub transitioned_at: DateTime<Utc>,
}

/// In-memory state of one analysis request
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub session_id: String,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    /// Set on reaching a terminal stage
    pub ended_at: Option<DateTime<Utc>>,
    /// Failure message, set on reaching FAILED
    pub failure: Option<String>,
}

impl AnalysisSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            stage: Stage::Validating,
            started_at: Utc::now(),
            ended_at: None,
            failure: None,
        }
    }

    /// Transition to a new stage
    pub fn transition_to(&mut self, new_stage: Stage) -> StageTransition {
        debug_assert!(
            self.stage.can_transition_to(new_stage),
            "illegal stage transition {:?} -> {:?}",
            self.stage,
            new_stage
        );

        let transition = StageTransition {
            session_id: self.session_id.clone(),
            old_stage: self.stage,
            new_stage,
            transitioned_at: Utc::now(),
        };
        self.stage = new_stage;

        if new_stage.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        transition
    }

    /// Move to FAILED, recording the triggering message
    pub fn fail(&mut self, message: impl Into<String>) -> StageTransition {
        self.failure = Some(message.into());
        self.transition_to(Stage::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestones_are_monotonic() {
        let mut last = 0.0;
        for (i, stage) in Stage::PIPELINE.iter().enumerate() {
            let m = stage.milestone().expect("pipeline stage has milestone");
            assert_eq!(m.step_index as usize, i + 1);
            assert!(m.start_percentage >= last, "{:?} starts below previous", stage);
            assert!(m.completion_percentage > m.start_percentage);
            last = m.completion_percentage;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn test_non_pipeline_stages_have_no_milestone() {
        for stage in [Stage::Validating, Stage::Demo, Stage::Completed, Stage::Failed] {
            assert!(stage.milestone().is_none());
        }
    }

    #[test]
    fn test_transition_rules() {
        assert!(Stage::Validating.can_transition_to(Stage::Demo));
        assert!(Stage::Validating.can_transition_to(Stage::Probing));
        assert!(!Stage::Validating.can_transition_to(Stage::Transcription));
        assert!(Stage::Probing.can_transition_to(Stage::AudioExtraction));
        assert!(!Stage::Probing.can_transition_to(Stage::FrameExtraction));
        assert!(Stage::Assembling.can_transition_to(Stage::Completed));
        assert!(Stage::Demo.can_transition_to(Stage::Completed));
        assert!(Stage::ObjectDetection.can_transition_to(Stage::Failed));
        assert!(!Stage::Completed.can_transition_to(Stage::Failed));
        assert!(!Stage::Failed.can_transition_to(Stage::Completed));
    }

    #[test]
    fn test_fail_records_message_and_end_time() {
        let mut session = AnalysisSession::new("s1");
        session.transition_to(Stage::Probing);
        let transition = session.fail("ffprobe exited with status 1");

        assert_eq!(transition.old_stage, Stage::Probing);
        assert_eq!(session.stage, Stage::Failed);
        assert!(session.is_terminal());
        assert!(session.ended_at.is_some());
        assert_eq!(session.failure.as_deref(), Some("ffprobe exited with status 1"));
    }
}
