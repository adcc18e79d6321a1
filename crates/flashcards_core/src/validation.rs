//! crates/flashcards_core/src/validation.rs
//!
//! Input validation for generation requests and the acceptance filter applied
//! to model candidates. Lengths are counted in characters, after trimming.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::domain::{CallerIdentity, FlashcardCandidate, GenerationRequest, NewProposal, ProposalStatus};
use crate::error::GenerationError;

pub const MIN_TEXT_CHARS: usize = 100;
pub const MAX_DOMAIN_CHARS: usize = 100;
pub const MIN_QUESTION_CHARS: usize = 50;
pub const MAX_QUESTION_CHARS: usize = 10_000;
pub const MIN_ANSWER_CHARS: usize = 1;
pub const MAX_ANSWER_CHARS: usize = 500;

//=========================================================================================
// Request Validation
//=========================================================================================

impl GenerationRequest {
    /// Parses and validates a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self, GenerationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(GenerationError::InvalidRequest(
                "Request body is empty".to_string(),
            ));
        }

        let value: Value = serde_json::from_slice(body).map_err(|e| {
            GenerationError::InvalidRequest(format!("Invalid JSON in request body: {}", e))
        })?;

        match value {
            Value::Object(fields) => Self::from_fields(fields),
            _ => Err(GenerationError::InvalidRequest(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }

    fn from_fields(mut fields: Map<String, Value>) -> Result<Self, GenerationError> {
        // `source_text` is an accepted synonym for `text`.
        let text = match fields.remove("text") {
            None | Some(Value::Null) => fields.remove("source_text"),
            text => text,
        };

        let text = match text {
            Some(Value::String(text)) => text,
            _ => {
                return Err(GenerationError::validation_with(
                    "Field 'text' is required and must be a string",
                    json!({ "field": "text" }),
                ))
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::validation_with(
                "Field 'text' must not be empty",
                json!({ "field": "text" }),
            ));
        }

        let text_len = text.chars().count();
        if text_len < MIN_TEXT_CHARS {
            return Err(GenerationError::validation_with(
                format!("Field 'text' must be at least {} characters long", MIN_TEXT_CHARS),
                json!({
                    "field": "text",
                    "min_length": MIN_TEXT_CHARS,
                    "actual_length": text_len,
                }),
            ));
        }

        let domain = match fields.remove("domain") {
            None | Some(Value::Null) => None,
            Some(Value::String(domain)) => validate_domain(&domain)?,
            Some(_) => {
                return Err(GenerationError::validation_with(
                    "Field 'domain' must be a string",
                    json!({ "field": "domain" }),
                ))
            }
        };

        Ok(Self {
            text: text.to_string(),
            domain,
        })
    }
}

fn validate_domain(domain: &str) -> Result<Option<String>, GenerationError> {
    let domain = domain.trim();
    let domain_len = domain.chars().count();
    if domain_len > MAX_DOMAIN_CHARS {
        return Err(GenerationError::validation_with(
            format!("Field 'domain' must be at most {} characters long", MAX_DOMAIN_CHARS),
            json!({
                "field": "domain",
                "max_length": MAX_DOMAIN_CHARS,
                "actual_length": domain_len,
            }),
        ));
    }
    Ok((!domain.is_empty()).then(|| domain.to_string()))
}

//=========================================================================================
// Candidate Acceptance Filter
//=========================================================================================

/// Turns the model's raw flashcard list into accepted candidates.
///
/// Invalid items are dropped with a warning. Fails only when nothing survives.
pub fn accept_candidates(
    raw: &[Value],
    detected_domain: Option<&str>,
    request_domain: Option<&str>,
) -> Result<Vec<FlashcardCandidate>, GenerationError> {
    let accepted: Vec<FlashcardCandidate> = raw
        .iter()
        .enumerate()
        .filter_map(|(index, item)| accept_candidate(index, item, detected_domain, request_domain))
        .collect();

    if accepted.is_empty() {
        return Err(GenerationError::validation_with(
            "The source text did not yield any valid flashcards. Try providing a longer or more detailed text.",
            json!({ "candidates_received": raw.len(), "candidates_accepted": 0 }),
        ));
    }

    if accepted.len() < raw.len() {
        warn!(
            received = raw.len(),
            accepted = accepted.len(),
            "dropped invalid flashcard candidates"
        );
    }

    Ok(accepted)
}

fn accept_candidate(
    index: usize,
    item: &Value,
    detected_domain: Option<&str>,
    request_domain: Option<&str>,
) -> Option<FlashcardCandidate> {
    let question = item.get("question").and_then(Value::as_str);
    let answer = item.get("correct_answer").and_then(Value::as_str);
    let (Some(question), Some(answer)) = (question, answer) else {
        warn!(index, "skipping flashcard candidate without string question/correct_answer");
        return None;
    };

    let question = question.trim();
    let answer = answer.trim();

    let question_len = question.chars().count();
    if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&question_len) {
        warn!(index, question_len, "skipping flashcard candidate: question length out of bounds");
        return None;
    }

    let answer_len = answer.chars().count();
    if !(MIN_ANSWER_CHARS..=MAX_ANSWER_CHARS).contains(&answer_len) {
        warn!(index, answer_len, "skipping flashcard candidate: answer length out of bounds");
        return None;
    }

    let own_domain = item.get("domain").and_then(Value::as_str);
    let domain = [own_domain, detected_domain, request_domain]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|d| !d.is_empty())
        .map(str::to_string);

    Some(FlashcardCandidate {
        question: question.to_string(),
        correct_answer: answer.to_string(),
        domain,
    })
}

impl FlashcardCandidate {
    /// Stamps an accepted candidate as a pending proposal row.
    pub fn into_proposal(self, caller: &CallerIdentity, generation_session_id: &str) -> NewProposal {
        NewProposal {
            user_id: caller.user_id.clone(),
            question: self.question,
            correct_answer: self.correct_answer,
            image_url: None,
            domain: self.domain,
            generation_session_id: generation_session_id.to_string(),
            status: ProposalStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn question(len: usize) -> String {
        "q".repeat(len)
    }

    fn candidate(question: &str, answer: &str) -> Value {
        json!({ "question": question, "correct_answer": answer, "domain": "" })
    }

    fn assert_validation_error(result: Result<GenerationRequest, GenerationError>, field: &str) {
        match result {
            Err(GenerationError::Validation { message, details }) => {
                assert!(message.contains(field), "message should name {field}: {message}");
                assert_eq!(details.unwrap()["field"], field);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn text_of_exactly_100_chars_is_accepted() {
        let text = "a".repeat(100);
        let request = GenerationRequest::parse(&body(json!({ "text": text }))).unwrap();
        assert_eq!(request.text.len(), 100);
        assert_eq!(request.domain, None);
    }

    #[test]
    fn text_of_99_chars_is_rejected() {
        let result = GenerationRequest::parse(&body(json!({ "text": "a".repeat(99) })));
        match result {
            Err(GenerationError::Validation { message, details }) => {
                assert!(message.contains("100"));
                let details = details.unwrap();
                assert_eq!(details["min_length"], 100);
                assert_eq!(details["actual_length"], 99);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn text_length_is_measured_after_trimming() {
        let padded = format!("   {}   ", "a".repeat(99));
        assert_validation_error(GenerationRequest::parse(&body(json!({ "text": padded }))), "text");
    }

    #[test]
    fn source_text_is_a_synonym_for_text() {
        let text = "b".repeat(150);
        let request = GenerationRequest::parse(&body(json!({ "source_text": text }))).unwrap();
        assert_eq!(request.text, "b".repeat(150));
    }

    #[test]
    fn missing_blank_or_non_string_text_is_a_validation_error() {
        assert_validation_error(GenerationRequest::parse(&body(json!({}))), "text");
        assert_validation_error(GenerationRequest::parse(&body(json!({ "text": "   " }))), "text");
        assert_validation_error(GenerationRequest::parse(&body(json!({ "text": 42 }))), "text");
    }

    #[test]
    fn empty_or_malformed_body_is_an_invalid_request() {
        for raw in [&b""[..], b"   ", b"{not json", b"[1,2,3]"] {
            let err = GenerationRequest::parse(raw).unwrap_err();
            assert!(matches!(err, GenerationError::InvalidRequest(_)), "{:?}", err);
        }
    }

    #[test]
    fn domain_boundaries() {
        let text = "a".repeat(120);
        let ok = GenerationRequest::parse(&body(json!({ "text": text, "domain": "d".repeat(100) })))
            .unwrap();
        assert_eq!(ok.domain.as_deref().map(str::len), Some(100));

        assert_validation_error(
            GenerationRequest::parse(&body(json!({ "text": text, "domain": "d".repeat(101) }))),
            "domain",
        );
        assert_validation_error(
            GenerationRequest::parse(&body(json!({ "text": text, "domain": 7 }))),
            "domain",
        );
    }

    #[test]
    fn blank_domain_is_treated_as_absent() {
        let text = "a".repeat(120);
        let request =
            GenerationRequest::parse(&body(json!({ "text": text, "domain": "  History  " }))).unwrap();
        assert_eq!(request.domain.as_deref(), Some("History"));

        let request = GenerationRequest::parse(&body(json!({ "text": text, "domain": "   " }))).unwrap();
        assert_eq!(request.domain, None);
    }

    #[test]
    fn drops_exactly_the_out_of_bounds_candidates() {
        let raw = vec![
            candidate(&question(50), "answer"),
            candidate(&question(49), "answer"),
            candidate(&question(10_000), &"a".repeat(500)),
            candidate(&question(10_001), "answer"),
            candidate(&question(60), &"a".repeat(501)),
            candidate(&question(60), "   "),
            json!("not an object"),
        ];

        let accepted = accept_candidates(&raw, None, None).unwrap();
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].question.len(), 50);
        assert_eq!(accepted[1].correct_answer.len(), 500);
    }

    #[test]
    fn all_invalid_candidates_is_a_validation_error() {
        let raw = vec![candidate("too short", "answer"), candidate(&question(60), "")];
        let err = accept_candidates(&raw, None, None).unwrap_err();
        assert!(matches!(err, GenerationError::Validation { .. }));
        assert!(err.to_string().contains("did not yield any valid flashcards"));

        assert!(accept_candidates(&[], None, None).is_err());
    }

    #[test]
    fn candidate_fields_are_trimmed() {
        let raw = vec![json!({
            "question": format!("  {}  ", question(50)),
            "correct_answer": "  Paris  ",
            "domain": "Geography",
        })];
        let accepted = accept_candidates(&raw, None, None).unwrap();
        assert_eq!(accepted[0].question, question(50));
        assert_eq!(accepted[0].correct_answer, "Paris");
    }

    #[test]
    fn domain_resolution_order() {
        let own = json!({ "question": question(60), "correct_answer": "a", "domain": "Own" });
        let blank = json!({ "question": question(60), "correct_answer": "a", "domain": "" });
        let missing = json!({ "question": question(60), "correct_answer": "a" });

        let accepted =
            accept_candidates(&[own, blank], Some("Detected"), Some("Requested")).unwrap();
        assert_eq!(accepted[0].domain.as_deref(), Some("Own"));
        assert_eq!(accepted[1].domain.as_deref(), Some("Detected"));

        let accepted = accept_candidates(&[missing.clone()], None, Some("Requested")).unwrap();
        assert_eq!(accepted[0].domain.as_deref(), Some("Requested"));

        let accepted = accept_candidates(&[missing], None, None).unwrap();
        assert_eq!(accepted[0].domain, None);
    }

    #[test]
    fn accepted_candidates_become_pending_proposals() {
        let caller = CallerIdentity {
            user_id: "user-1".to_string(),
            bearer_token: "a.b.c".to_string(),
        };
        let proposal = FlashcardCandidate {
            question: question(60),
            correct_answer: "answer".to_string(),
            domain: Some("Math".to_string()),
        }
        .into_proposal(&caller, "session-1");

        assert_eq!(proposal.user_id, "user-1");
        assert_eq!(proposal.image_url, None);
        assert_eq!(proposal.generation_session_id, "session-1");
        assert_eq!(proposal.status, ProposalStatus::Pending);

        let row = serde_json::to_value(&proposal).unwrap();
        assert_eq!(row["status"], "pending");
        assert!(row["image_url"].is_null());
    }
}
