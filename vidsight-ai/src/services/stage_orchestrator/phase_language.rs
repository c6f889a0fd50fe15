//! Stages 4, 5, 7, 8: TRANSCRIPTION, SEGMENT_SENTIMENT, OVERALL_SENTIMENT, QA_GENERATION

use super::AnalysisOrchestrator;
use crate::collaborators::Collaborators;
use crate::error::AnalysisError;
use crate::models::{
    AnalysisSession, EnrichedSegment, QaPair, SentimentResult, Stage, Transcription,
};
use crate::services::segment_enricher;
use std::path::Path;

impl AnalysisOrchestrator {
    /// Stage 4: TRANSCRIPTION
    pub(super) async fn stage_transcription(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        audio: &Path,
    ) -> Result<Transcription, AnalysisError> {
        self.enter_stage(session, Stage::Transcription);

        let transcription = collaborators
            .transcriber
            .transcribe(audio)
            .await
            .map_err(|e| AnalysisError::stage(Stage::Transcription, e))?;

        tracing::info!(
            session_id = %session.session_id,
            language = %transcription.language,
            segments = transcription.segments.len(),
            chars = transcription.text.len(),
            "Audio transcribed"
        );
        self.complete_stage(
            session,
            Stage::Transcription,
            Some(format!("{} segments", transcription.segments.len())),
        );
        Ok(transcription)
    }

    /// Stage 5: SEGMENT_SENTIMENT - batch call, then enrichment
    pub(super) async fn stage_segment_sentiment(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        transcription: &Transcription,
    ) -> Result<Vec<EnrichedSegment>, AnalysisError> {
        self.enter_stage(session, Stage::SegmentSentiment);

        let records = collaborators
            .sentiment
            .batch_segments(&transcription.segments)
            .await
            .map_err(|e| AnalysisError::stage(Stage::SegmentSentiment, e))?;

        let enriched = segment_enricher::enrich(&transcription.segments, &records);

        self.complete_stage(session, Stage::SegmentSentiment, None);
        Ok(enriched)
    }

    /// Stage 7: OVERALL_SENTIMENT
    pub(super) async fn stage_overall_sentiment(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        full_text: &str,
    ) -> Result<SentimentResult, AnalysisError> {
        self.enter_stage(session, Stage::OverallSentiment);

        let sentiment = collaborators
            .sentiment
            .summarize(full_text)
            .await
            .map_err(|e| AnalysisError::stage(Stage::OverallSentiment, e))?;

        tracing::debug!(
            session_id = %session.session_id,
            sentiment = ?sentiment.overall_sentiment,
            confidence = sentiment.confidence,
            "Overall sentiment"
        );
        self.complete_stage(session, Stage::OverallSentiment, None);
        Ok(sentiment)
    }

    /// Stage 8: QA_GENERATION - failure yields a single fallback pair
    pub(super) async fn stage_qa_generation(
        &self,
        session: &mut AnalysisSession,
        collaborators: &Collaborators,
        transcription: &Transcription,
    ) -> Vec<QaPair> {
        self.enter_stage(session, Stage::QaGeneration);

        let pairs = match collaborators
            .qa
            .generate_qa(
                &transcription.text,
                self.config.qa_pair_count,
                Some(transcription.segments.as_slice()),
            )
            .await
        {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::warn!(
                    session_id = %session.session_id,
                    error = %e,
                    "QA generation failed, using fallback pair"
                );
                vec![QaPair::fallback(&e.to_string())]
            }
        };

        self.complete_stage(
            session,
            Stage::QaGeneration,
            Some(format!("{} pairs", pairs.len())),
        );
        pairs
    }
}
