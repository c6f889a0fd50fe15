//! Segment enricher
//!
//! Attaches the speaker label and per-segment sentiment to raw transcript segments.
//! Output is one-to-one with the input, same ids, same order.

use crate::models::{
    EnrichedSegment, SegmentSentimentRecord, Sentiment, TranscriptSegment, DEFAULT_SPEAKER,
    UNKNOWN_MOOD,
};
use std::collections::HashMap;

/// Merge sentiment records into raw segments
///
/// Segments without a matching record (by `segment_id`) get neutral sentiment and
/// the single mood keyword `"unknown"`. When several records share an id the first
/// one is used.
pub fn enrich(
    raw_segments: &[TranscriptSegment],
    sentiments: &[SegmentSentimentRecord],
) -> Vec<EnrichedSegment> {
    let mut by_id: HashMap<u32, &SegmentSentimentRecord> = HashMap::with_capacity(sentiments.len());
    for record in sentiments {
        by_id.entry(record.segment_id).or_insert(record);
    }

    let mut missing = 0usize;
    let enriched = raw_segments
        .iter()
        .map(|segment| {
            let (sentiment, mood_keywords) = match by_id.get(&segment.id) {
                Some(record) => (record.sentiment, record.mood_keywords.clone()),
                None => {
                    missing += 1;
                    (Sentiment::Neutral, vec![UNKNOWN_MOOD.to_string()])
                }
            };

            EnrichedSegment {
                id: segment.id,
                start: segment.start,
                end: segment.end,
                text: segment.text.clone(),
                speaker: DEFAULT_SPEAKER.to_string(),
                sentiment,
                mood_keywords,
            }
        })
        .collect();

    if missing > 0 {
        tracing::warn!(
            missing,
            total = raw_segments.len(),
            "Segments without sentiment record defaulted to neutral"
        );
    }

    enriched
}
