//! Demo engine
//!
//! Produces a canned [`AnalysisResult`] without contacting any collaborator. The
//! content is fixed; only the display name varies. Timing metadata
//! (`processedAt`, `processingTime`) is left for the caller to stamp.

use crate::models::{
    AnalysisResult, DetectedObjectFrame, DetectedObjectSummary, EnrichedSegment, QaPair,
    ResultMetadata, Sentiment, SentimentResult, Snippet, TranscriptSection, DEFAULT_SPEAKER,
};

pub const DEMO_NOTE: &str =
    "Demo mode: this is sample data. Provide an API key to analyze your own video.";

const DEMO_DURATION_SECS: f64 = 42.0;
const DEMO_LANGUAGE: &str = "english";

/// (id, start, end, text, sentiment, mood keywords)
const DEMO_SEGMENTS: [(u32, f64, f64, &str, Sentiment, &[&str]); 4] = [
    (
        0,
        0.0,
        9.5,
        "Hi everyone, welcome back to the channel. Today I'm unboxing the new laptop I ordered last week.",
        Sentiment::Positive,
        &["excited", "welcoming"],
    ),
    (
        1,
        9.5,
        21.0,
        "The build quality feels really solid and the screen is bright enough to use next to the window.",
        Sentiment::Positive,
        &["impressed", "satisfied"],
    ),
    (
        2,
        21.0,
        32.5,
        "Battery life is the weak spot though, I only got about five hours with normal use.",
        Sentiment::Negative,
        &["disappointed", "honest"],
    ),
    (
        3,
        32.5,
        42.0,
        "Overall it's a good machine for the price. Let me know in the comments what you want me to test next.",
        Sentiment::Neutral,
        &["balanced", "inviting"],
    ),
];

/// (name, [(frame_id, confidence, context)]) over 42 frames at 1 fps, stride 2
const DEMO_OBJECTS: [(&str, &[(u32, f64, &str)]); 4] = [
    (
        "laptop",
        &[
            (1, 0.94, "closed laptop on a wooden desk"),
            (3, 0.96, "laptop being lifted out of the box"),
            (11, 0.97, "open laptop with screen on"),
            (23, 0.95, "laptop showing battery settings"),
            (37, 0.93, "laptop in front of the presenter"),
        ],
    ),
    (
        "person",
        &[
            (1, 0.91, "presenter facing the camera"),
            (15, 0.89, "presenter pointing at the screen"),
            (33, 0.92, "presenter smiling at the camera"),
            (41, 0.9, "presenter waving goodbye"),
        ],
    ),
    (
        "box",
        &[
            (3, 0.87, "open cardboard shipping box"),
            (5, 0.84, "packaging inserts beside the box"),
        ],
    ),
    ("coffee mug", &[(15, 0.78, "white mug on the desk corner")]),
];

const DEMO_TOTAL_FRAMES: f64 = 42.0;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn demo_segments() -> Vec<EnrichedSegment> {
    DEMO_SEGMENTS
        .iter()
        .map(|(id, start, end, text, sentiment, moods)| EnrichedSegment {
            id: *id,
            start: *start,
            end: *end,
            text: text.to_string(),
            speaker: DEFAULT_SPEAKER.to_string(),
            sentiment: *sentiment,
            mood_keywords: moods.iter().map(|m| m.to_string()).collect(),
        })
        .collect()
}

fn demo_objects() -> Vec<DetectedObjectSummary> {
    DEMO_OBJECTS
        .iter()
        .map(|(name, frames)| {
            let frames: Vec<DetectedObjectFrame> = frames
                .iter()
                .map(|(frame_id, confidence, context)| DetectedObjectFrame {
                    frame_id: *frame_id,
                    timestamp: (*frame_id - 1) as f64,
                    confidence: *confidence,
                    context: context.to_string(),
                })
                .collect();
            let mean = frames.iter().map(|f| f.confidence).sum::<f64>() / frames.len() as f64;

            DetectedObjectSummary {
                name: name.to_string(),
                appearance_percentage: round_to(frames.len() as f64 / DEMO_TOTAL_FRAMES * 100.0, 1),
                avg_confidence: round_to(mean, 2),
                frames,
            }
        })
        .collect()
}

fn snippet(segment_id: u32) -> Snippet {
    Snippet {
        segment_id,
        text: DEMO_SEGMENTS[segment_id as usize].3.to_string(),
    }
}

fn demo_qa_pairs() -> Vec<QaPair> {
    vec![
        QaPair {
            question: "What product is being reviewed in the video?".to_string(),
            answer: "A new laptop that the presenter unboxes on camera.".to_string(),
            relevant_snippets: vec![snippet(0)],
        },
        QaPair {
            question: "What does the presenter like about the laptop?".to_string(),
            answer: "The solid build quality and the bright screen.".to_string(),
            relevant_snippets: vec![snippet(1)],
        },
        QaPair {
            question: "What is the laptop's main weakness?".to_string(),
            answer: "Battery life, at roughly five hours of normal use.".to_string(),
            relevant_snippets: vec![snippet(2)],
        },
        QaPair {
            question: "What is the presenter's overall verdict?".to_string(),
            answer: "It is a good machine for the price.".to_string(),
            relevant_snippets: vec![snippet(3)],
        },
    ]
}

/// Canned analysis result for `display_name`
pub fn generate(display_name: &str) -> AnalysisResult {
    let segments = demo_segments();
    let full_text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    AnalysisResult {
        metadata: ResultMetadata {
            video_file: display_name.to_string(),
            video_duration: DEMO_DURATION_SECS,
            processed_at: String::new(),
            processing_time: 0.0,
            demo_mode: Some(true),
            note: Some(DEMO_NOTE.to_string()),
        },
        transcript: TranscriptSection {
            full_text,
            language: DEMO_LANGUAGE.to_string(),
            segments,
        },
        sentiment: SentimentResult {
            overall_sentiment: Sentiment::Positive,
            mood_keywords: vec![
                "enthusiastic".to_string(),
                "informative".to_string(),
                "honest".to_string(),
            ],
            confidence: 0.82,
            short_summary: "An upbeat laptop unboxing and first-impressions review that praises \
                            the build and screen but flags weak battery life."
                .to_string(),
        },
        objects_detected: demo_objects(),
        qa_pairs: demo_qa_pairs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_DISPLAY_NAME: &str = "demo-video.mp4";

    #[test]
    fn test_demo_flag_and_note() {
        let result = generate("holiday.mp4");
        assert!(result.is_demo());
        assert_eq!(result.metadata.video_file, "holiday.mp4");
        assert!(result.metadata.note.is_some());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(generate("a.mp4"), generate("a.mp4"));
    }

    #[test]
    fn test_four_enriched_segments() {
        let result = generate(DEMO_DISPLAY_NAME);
        let segments = &result.transcript.segments;

        assert_eq!(segments.len(), 4);
        let ids: Vec<u32> = segments.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(segments.iter().all(|s| s.speaker == DEFAULT_SPEAKER));
        assert!(segments.iter().all(|s| !s.mood_keywords.is_empty()));
        assert!(result.transcript.full_text.starts_with(&segments[0].text));
    }

    #[test]
    fn test_objects_obey_aggregation_rules() {
        let objects = generate(DEMO_DISPLAY_NAME).objects_detected;

        assert!(!objects.is_empty());
        for pair in objects.windows(2) {
            assert!(pair[0].appearance_percentage >= pair[1].appearance_percentage);
        }
        for object in &objects {
            assert!((0.0..=100.0).contains(&object.appearance_percentage));
            assert!((0.0..=1.0).contains(&object.avg_confidence));
            for frame in &object.frames {
                // 1 fps, stride 2: odd ordinals only
                assert_eq!(frame.frame_id % 2, 1);
                assert_eq!(frame.timestamp, (frame.frame_id - 1) as f64);
            }
        }
        assert_eq!(objects[0].name, "laptop");
        assert_eq!(objects[0].appearance_percentage, 11.9);
        assert_eq!(objects[0].avg_confidence, 0.95);
    }

    #[test]
    fn test_qa_snippets_quote_segments() {
        let result = generate(DEMO_DISPLAY_NAME);
        assert!(!result.qa_pairs.is_empty());
        for pair in &result.qa_pairs {
            for snippet in &pair.relevant_snippets {
                let segment = &result.transcript.segments[snippet.segment_id as usize];
                assert_eq!(segment.text, snippet.text);
            }
        }
    }

    #[test]
    fn test_serializes_demo_fields() {
        let json = serde_json::to_value(generate(DEMO_DISPLAY_NAME)).unwrap();
        assert_eq!(json["metadata"]["demoMode"], true);
        assert!(json["metadata"]["note"].is_string());
        assert!(json["objects_detected"].is_array());
        assert!(json["qa_pairs"].is_array());
    }
}
