//! Question/answer generation and response parsing
//!
//! Text models do not spell the response keys consistently, so parsing goes
//! through explicit alias lists; the first alias present wins.

use super::{InferenceError, OpenAiClient, QaGenerator};
use crate::models::{QaPair, Snippet, TranscriptSegment};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Keys that may hold the list of pairs (a bare top-level array is also accepted)
const CONTAINER_KEYS: &[&str] = &["qa_pairs", "questions", "qaPairs", "pairs"];
const QUESTION_KEYS: &[&str] = &["question", "q"];
const ANSWER_KEYS: &[&str] = &["answer", "a"];
const SNIPPET_LIST_KEYS: &[&str] = &["relevantSnippets", "relevant_snippets", "snippets"];
const SNIPPET_ID_KEYS: &[&str] = &["segment_id", "segmentId"];
const SNIPPET_TEXT_KEYS: &[&str] = &["text", "snippet"];

fn first_field<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| object.get(*key))
}

fn first_str<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a str> {
    first_field(object, aliases)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Segment ids arrive as numbers or numeric strings
fn segment_id(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_snippet(value: &Value) -> Option<Snippet> {
    let object = value.as_object()?;
    Some(Snippet {
        segment_id: first_field(object, SNIPPET_ID_KEYS).and_then(segment_id)?,
        text: first_field(object, SNIPPET_TEXT_KEYS)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn parse_pair(value: &Value) -> Option<QaPair> {
    let object = value.as_object()?;

    let relevant_snippets = first_field(object, SNIPPET_LIST_KEYS)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_snippet).collect())
        .unwrap_or_default();

    Some(QaPair {
        question: first_str(object, QUESTION_KEYS)?.to_string(),
        answer: first_str(object, ANSWER_KEYS)?.to_string(),
        relevant_snippets,
    })
}

/// Parse a QA generation response
///
/// Items lacking a question or an answer are skipped. A response that yields no
/// pairs at all is a parse error.
pub fn parse_qa_response(value: &Value) -> Result<Vec<QaPair>, InferenceError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(object) => first_field(object, CONTAINER_KEYS)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                InferenceError::ParseError(format!(
                    "no QA list under any of {:?}",
                    CONTAINER_KEYS
                ))
            })?,
        _ => {
            return Err(InferenceError::ParseError(
                "QA response is neither an object nor an array".to_string(),
            ))
        }
    };

    let pairs: Vec<QaPair> = items.iter().filter_map(parse_pair).collect();
    if pairs.is_empty() {
        return Err(InferenceError::ParseError("QA response contained no usable pairs".to_string()));
    }

    Ok(pairs)
}

fn qa_prompt(desired_count: usize, with_segments: bool) -> String {
    let citation = if with_segments {
        "Cite the transcript segments that support each answer by their id."
    } else {
        "Quote the transcript text that supports each answer, using segment_id 0."
    };

    format!(
        "You write comprehension questions about video transcripts. Produce exactly {} \
         question/answer pairs. {} Respond with a JSON object \
         {{\"qa_pairs\": [{{\"question\": string, \"answer\": string, \
         \"relevantSnippets\": [{{\"segment_id\": number, \"text\": string}}]}}]}}.",
        desired_count, citation
    )
}

#[async_trait]
impl QaGenerator for OpenAiClient {
    async fn generate_qa(
        &self,
        full_text: &str,
        desired_count: usize,
        segments: Option<&[TranscriptSegment]>,
    ) -> Result<Vec<QaPair>, InferenceError> {
        let user_content = match segments {
            Some(segments) if !segments.is_empty() => {
                let listed: Vec<Value> = segments
                    .iter()
                    .map(|s| json!({ "id": s.id, "start": s.start, "end": s.end, "text": s.text }))
                    .collect();
                json!({ "transcript": full_text, "segments": listed }).to_string()
            }
            _ => json!({ "transcript": full_text }).to_string(),
        };

        let prompt = qa_prompt(desired_count, segments.is_some_and(|s| !s.is_empty()));
        let value = self
            .chat_json(&self.models.text, &prompt, Value::String(user_content))
            .await?;

        let mut pairs = parse_qa_response(&value)?;
        pairs.truncate(desired_count.max(1));
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_keys() {
        let pairs = parse_qa_response(&json!({
            "qa_pairs": [{
                "question": "What is shown?",
                "answer": "A laptop.",
                "relevantSnippets": [{"segment_id": 2, "text": "my new laptop"}]
            }]
        }))
        .unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].relevant_snippets[0].segment_id, 2);
        assert_eq!(pairs[0].relevant_snippets[0].text, "my new laptop");
    }

    #[test]
    fn test_alias_keys() {
        let pairs = parse_qa_response(&json!({
            "questions": [
                {"q": "Who speaks?", "a": "The host.", "relevant_snippets": [{"segmentId": "1", "snippet": "hi all"}]},
                {"question": "Where?", "answer": "A studio.", "snippets": []}
            ]
        }))
        .unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "Who speaks?");
        assert_eq!(pairs[0].relevant_snippets[0].segment_id, 1);
        assert_eq!(pairs[0].relevant_snippets[0].text, "hi all");
        assert!(pairs[1].relevant_snippets.is_empty());
    }

    #[test]
    fn test_container_alias_order() {
        // `qa_pairs` outranks `pairs`
        let pairs = parse_qa_response(&json!({
            "pairs": [{"question": "ignored", "answer": "ignored"}],
            "qa_pairs": [{"question": "used", "answer": "used"}]
        }))
        .unwrap();
        assert_eq!(pairs[0].question, "used");
    }

    #[test]
    fn test_bare_array() {
        let pairs = parse_qa_response(&json!([{"question": "Q", "answer": "A"}])).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].relevant_snippets.is_empty());
    }

    #[test]
    fn test_incomplete_items_skipped() {
        let pairs = parse_qa_response(&json!({
            "qa_pairs": [{"question": "no answer"}, {"question": "Q", "answer": "A"}]
        }))
        .unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_unusable_responses_are_errors() {
        assert!(parse_qa_response(&json!({"result": []})).is_err());
        assert!(parse_qa_response(&json!({"qa_pairs": [{"answer": "A"}]})).is_err());
        assert!(parse_qa_response(&json!("text")).is_err());
    }

    #[test]
    fn test_prompt_mentions_count() {
        assert!(qa_prompt(5, true).contains("exactly 5"));
    }
}
