//! Stages 1-3: PROBING, AUDIO_EXTRACTION, FRAME_EXTRACTION
//!
//! Media decoding through the [`MediaDecoder`](crate::collaborators::MediaDecoder)
//! collaborator. Any decode error aborts the request.

use super::AnalysisOrchestrator;
use crate::collaborators::Collaborators;
use crate::error::AnalysisError;
use crate::models::{AnalysisSession, ExtractedFrame, Stage};
use std::path::{Path, PathBuf};

const AUDIO_FILE: &str = "audio.wav";
const FRAMES_DIR: &str = "frames";

impl AnalysisOrchestrator {
    /// Stage 1: PROBING - container duration
    pub(super) async fn stage_probing(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        video: &Path,
    ) -> Result<f64, AnalysisError> {
        self.enter_stage(session, Stage::Probing);

        let duration = collaborators
            .decoder
            .probe_duration(video)
            .await
            .map_err(|e| AnalysisError::stage(Stage::Probing, e))?;

        tracing::info!(session_id = %session.session_id, duration_secs = duration, "Video probed");
        self.complete_stage(session, Stage::Probing, Some(format!("{:.1}s", duration)));
        Ok(duration)
    }

    /// Stage 2: AUDIO_EXTRACTION - mono PCM track into the working directory
    pub(super) async fn stage_audio_extraction(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        video: &Path,
        work_dir: &Path,
    ) -> Result<PathBuf, AnalysisError> {
        self.enter_stage(session, Stage::AudioExtraction);

        let audio = collaborators
            .decoder
            .extract_audio(video, &work_dir.join(AUDIO_FILE))
            .await
            .map_err(|e| AnalysisError::stage(Stage::AudioExtraction, e))?;

        self.complete_stage(session, Stage::AudioExtraction, None);
        Ok(audio)
    }

    /// Stage 3: FRAME_EXTRACTION - fixed-rate frame images, numbered from 1
    pub(super) async fn stage_frame_extraction(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        video: &Path,
        work_dir: &Path,
    ) -> Result<Vec<ExtractedFrame>, AnalysisError> {
        self.enter_stage(session, Stage::FrameExtraction);

        let frames_dir = work_dir.join(FRAMES_DIR);
        tokio::fs::create_dir_all(&frames_dir)
            .await
            .map_err(|e| AnalysisError::stage(Stage::FrameExtraction, e))?;

        let paths = collaborators
            .decoder
            .extract_frames(video, &frames_dir, self.config.frames_per_second)
            .await
            .map_err(|e| AnalysisError::stage(Stage::FrameExtraction, e))?;

        let frames: Vec<ExtractedFrame> = paths
            .into_iter()
            .zip(1u32..)
            .map(|(path, ordinal)| ExtractedFrame { ordinal, path })
            .collect();

        tracing::info!(
            session_id = %session.session_id,
            frames = frames.len(),
            fps = self.config.frames_per_second,
            "Frames extracted"
        );
        self.complete_stage(
            session,
            Stage::FrameExtraction,
            Some(format!("{} frames", frames.len())),
        );
        Ok(frames)
    }
}
