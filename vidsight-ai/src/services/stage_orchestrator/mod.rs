//! Stage orchestrator
//!
//! Runs one analysis request through the stage state machine:
//!
//! VALIDATING → DEMO | PROBING → AUDIO_EXTRACTION → FRAME_EXTRACTION → TRANSCRIPTION →
//! SEGMENT_SENTIMENT → OBJECT_DETECTION → OVERALL_SENTIMENT → QA_GENERATION → ASSEMBLING
//! → COMPLETED, any stage → FAILED
//!
//! # Architecture
//! Each pipeline stage is a `stage_*` method in a `phase_*` file. A stage:
//! 1. transitions the session and pushes its start milestone
//! 2. awaits exactly one collaborator or sub-component
//! 3. pushes its completion milestone
//!
//! A collaborator error aborts at the current stage as
//! [`AnalysisError::StageExecution`], except per-frame detection (absorbed by the
//! aggregator) and QA generation (replaced by a fallback pair).
//!
//! # Cleanup
//! The uploaded file and the per-request working directory are removed on every
//! exit path. Removal failures are logged only. The session's progress channel is
//! closed once the request reaches COMPLETED or FAILED.

use crate::collaborators::{CollaboratorProvider, Collaborators};
use crate::config::ServiceConfig;
use crate::error::AnalysisError;
use crate::models::{
    AnalysisRequest, AnalysisResponse, AnalysisResult, AnalysisSession, ResultMetadata, Stage,
    TranscriptSection, UploadedMedia,
};
use crate::services::demo_engine;
use crate::services::request_validator::{self, ExecutionMode};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;
use vidsight_common::{ProgressEvent, SessionRegistry};

mod phase_detection;
mod phase_language;
mod phase_media;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Analysis orchestrator service
pub struct AnalysisOrchestrator {
    config: Arc<ServiceConfig>,
    sessions: SessionRegistry,
    provider: Arc<dyn CollaboratorProvider>,
}

impl AnalysisOrchestrator {
    /// Create orchestrator
    ///
    /// # Arguments
    /// * `config` - Service configuration
    /// * `sessions` - Progress registry shared with the SSE endpoint
    /// * `provider` - Builds per-request collaborators from the caller's API key
    pub fn new(
        config: Arc<ServiceConfig>,
        sessions: SessionRegistry,
        provider: Arc<dyn CollaboratorProvider>,
    ) -> Self {
        Self {
            config,
            sessions,
            provider,
        }
    }

    /// Process one analysis request to completion
    ///
    /// The session id is the caller's when supplied, otherwise a fresh UUID.
    pub async fn process(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let start_time = Instant::now();
        let session_id = request
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut session = AnalysisSession::new(session_id.clone());

        tracing::info!(
            session_id = %session_id,
            video = request.media.as_ref().map(|m| m.original_name.as_str()).unwrap_or("<none>"),
            demo_flag = request.demo,
            "Starting analysis"
        );

        let outcome = self.run(&mut session, &request, start_time).await;

        if let Some(media) = &request.media {
            remove_upload(&media.path).await;
        }

        match &outcome {
            Ok(result) => {
                session.transition_to(Stage::Completed);
                tracing::info!(
                    session_id = %session_id,
                    demo = result.is_demo(),
                    objects = result.objects_detected.len(),
                    segments = result.transcript.segments.len(),
                    elapsed_secs = start_time.elapsed().as_secs_f64(),
                    "Analysis completed"
                );
            }
            Err(e) => {
                let failed_at = session.stage;
                session.fail(e.to_string());
                if e.is_validation() {
                    tracing::warn!(session_id = %session_id, error = %e, "Request rejected");
                } else {
                    tracing::error!(
                        session_id = %session_id,
                        stage = ?failed_at,
                        error = %e,
                        "Analysis failed"
                    );
                }
            }
        }

        self.sessions.unsubscribe(&session_id);

        outcome.map(|result| AnalysisResponse { session_id, result })
    }

    async fn run(
        &self,
        session: &mut AnalysisSession,
        request: &AnalysisRequest,
        start_time: Instant,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mode = request_validator::validate_request(request, &self.config)?;

        // Validation guarantees media is present
        let media = request.media.as_ref().ok_or_else(|| {
            AnalysisError::InputValidation("No video file provided".to_string())
        })?;

        match mode {
            ExecutionMode::Demo => self.run_demo(session, media, start_time).await,
            ExecutionMode::Pipeline => {
                let collaborators = self.provider.for_credential(&request.credential);
                self.run_pipeline(session, media, &collaborators, start_time)
                    .await
            }
        }
    }

    /// DEMO: canned result behind the same progress sequence as the real pipeline
    async fn run_demo(
        &self,
        session: &mut AnalysisSession,
        media: &UploadedMedia,
        start_time: Instant,
    ) -> Result<AnalysisResult, AnalysisError> {
        session.transition_to(Stage::Demo);
        tracing::info!(session_id = %session.session_id, "Demo mode, no collaborators used");

        let delay = Duration::from_millis(self.config.demo_step_delay_ms);
        for stage in Stage::PIPELINE {
            if let Some(milestone) = stage.milestone() {
                self.push(
                    session,
                    milestone.step_index,
                    milestone.start_message,
                    milestone.start_percentage,
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                self.push(
                    session,
                    milestone.step_index,
                    milestone.completion_message,
                    milestone.completion_percentage,
                );
            }
        }

        let mut result = demo_engine::generate(&media.original_name);
        stamp_timing(&mut result.metadata, start_time);
        Ok(result)
    }

    /// Real pipeline, inside a per-request working directory
    async fn run_pipeline(
        &self,
        session: &mut AnalysisSession,
        media: &UploadedMedia,
        collaborators: &Collaborators,
        start_time: Instant,
    ) -> Result<AnalysisResult, AnalysisError> {
        let work_dir = tempfile::Builder::new()
            .prefix("analysis-")
            .tempdir_in(self.config.work_dir())
            .map_err(|e| {
                AnalysisError::stage(
                    Stage::Probing,
                    format!("failed to create working directory: {}", e),
                )
            })?;

        tracing::debug!(
            session_id = %session.session_id,
            work_dir = %work_dir.path().display(),
            "Working directory created"
        );

        let result = self
            .run_stages(session, media, collaborators, work_dir.path(), start_time)
            .await;

        let work_path = work_dir.path().to_path_buf();
        if let Err(e) = work_dir.close() {
            tracing::warn!(
                work_dir = %work_path.display(),
                error = %e,
                "Failed to remove working directory"
            );
        }

        result
    }

    async fn run_stages(
        &self,
        session: &mut AnalysisSession,
        media: &UploadedMedia,
        collaborators: &Collaborators,
        work_dir: &Path,
        start_time: Instant,
    ) -> Result<AnalysisResult, AnalysisError> {
        let video = media.path.as_path();

        // Stages 1-3: media decoding
        let duration = self.stage_probing(session, collaborators, video).await?;
        let audio = self
            .stage_audio_extraction(session, collaborators, video, work_dir)
            .await?;
        let frames = self
            .stage_frame_extraction(session, collaborators, video, work_dir)
            .await?;

        // Stages 4-5: transcript
        let transcription = self
            .stage_transcription(session, collaborators, &audio)
            .await?;
        let segments = self
            .stage_segment_sentiment(session, collaborators, &transcription)
            .await?;

        // Stage 6: objects
        let objects_detected = self
            .stage_object_detection(session, collaborators, &frames)
            .await;

        // Stages 7-8: whole-transcript language tasks
        let sentiment = self
            .stage_overall_sentiment(session, collaborators, &transcription.text)
            .await?;
        let qa_pairs = self
            .stage_qa_generation(session, collaborators, &transcription)
            .await;

        // Stage 9
        self.enter_stage(session, Stage::Assembling);
        let mut metadata = ResultMetadata {
            video_file: media.original_name.clone(),
            video_duration: duration,
            processed_at: String::new(),
            processing_time: 0.0,
            demo_mode: None,
            note: None,
        };
        stamp_timing(&mut metadata, start_time);

        let result = AnalysisResult {
            metadata,
            transcript: TranscriptSection {
                full_text: transcription.text,
                language: transcription.language,
                segments,
            },
            sentiment,
            objects_detected,
            qa_pairs,
        };
        self.complete_stage(session, Stage::Assembling, None);

        Ok(result)
    }

    /// Transition into `stage` and push its start milestone
    pub(super) fn enter_stage(&self, session: &mut AnalysisSession, stage: Stage) {
        session.transition_to(stage);
        tracing::info!(session_id = %session.session_id, stage = ?stage, "Stage started");

        if let Some(milestone) = stage.milestone() {
            self.push(
                session,
                milestone.step_index,
                milestone.start_message,
                milestone.start_percentage,
            );
        }
    }

    /// Push the completion milestone of `stage`, with optional detail appended
    pub(super) fn complete_stage(
        &self,
        session: &AnalysisSession,
        stage: Stage,
        detail: Option<String>,
    ) {
        if let Some(milestone) = stage.milestone() {
            let message = match detail {
                Some(detail) => format!("{} ({})", milestone.completion_message, detail),
                None => milestone.completion_message.to_string(),
            };
            self.push(
                session,
                milestone.step_index,
                message,
                milestone.completion_percentage,
            );
        }
    }

    fn push(
        &self,
        session: &AnalysisSession,
        step_index: u32,
        message: impl Into<String>,
        percentage: f64,
    ) {
        self.sessions.push(
            &session.session_id,
            ProgressEvent::new(step_index, message, percentage),
        );
    }
}

/// Fill `processedAt` (now) and `processingTime` (seconds since `start_time`)
fn stamp_timing(metadata: &mut ResultMetadata, start_time: Instant) {
    metadata.processed_at = Utc::now().to_rfc3339();
    metadata.processing_time = round_to(start_time.elapsed().as_secs_f64(), 2);
}

async fn remove_upload(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Upload removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload"),
    }
}
