//! crates/flashcards_core/src/prompt.rs
//!
//! Builds the instruction messages and the structured-output schema sent to
//! the language model. Construction is deterministic for a given request.

use serde_json::{json, Value};

use crate::domain::GenerationRequest;
use crate::validation::{MAX_ANSWER_CHARS, MAX_QUESTION_CHARS, MIN_QUESTION_CHARS};

pub const GENERATION_TEMPERATURE: f32 = 0.7;
pub const GENERATION_MAX_TOKENS: u32 = 4000;
pub const RESPONSE_SCHEMA_NAME: &str = "flashcards_generation";

const SYSTEM_INSTRUCTIONS: &str = "You are an expert educator who writes high-quality study flashcards. \
You always answer with strictly valid JSON that matches the requested schema, without any commentary.";

/// Everything the model adapter needs to issue one completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPrompt {
    pub system: String,
    pub user: String,
    pub schema_name: String,
    pub schema: Value,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationPrompt {
    pub fn for_request(request: &GenerationRequest) -> Self {
        Self {
            system: SYSTEM_INSTRUCTIONS.to_string(),
            user: user_message(request),
            schema_name: RESPONSE_SCHEMA_NAME.to_string(),
            schema: response_schema(),
            temperature: GENERATION_TEMPERATURE,
            max_tokens: GENERATION_MAX_TOKENS,
        }
    }
}

fn user_message(request: &GenerationRequest) -> String {
    let domain_instruction = match &request.domain {
        Some(domain) => format!(
            "The flashcards belong to the domain \"{}\". Use this domain for every flashcard and as detected_domain.",
            domain
        ),
        None => "Detect the knowledge domain of the text automatically (for example History, Biology, Programming) \
and report it as detected_domain."
            .to_string(),
    };

    format!(
        "Create study flashcards from the source text below.\n\
\n\
{domain_instruction}\n\
\n\
Requirements:\n\
- Write the flashcards in the same language as the source text.\n\
- Each question must be between {min_q} and {max_q} characters long.\n\
- Each correct_answer must be at most {max_a} characters long.\n\
- Generate at least 3-5 flashcards, more if the text supports it.\n\
- Return strictly valid JSON with the fields flashcards and detected_domain.\n\
\n\
SOURCE TEXT:\n\
---\n\
{text}\n\
---",
        domain_instruction = domain_instruction,
        min_q = MIN_QUESTION_CHARS,
        max_q = MAX_QUESTION_CHARS,
        max_a = MAX_ANSWER_CHARS,
        text = request.text,
    )
}

/// JSON schema for the strict structured-output mode.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "flashcards": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "correct_answer": { "type": "string" },
                        "domain": { "type": "string" }
                    },
                    "required": ["question", "correct_answer", "domain"],
                    "additionalProperties": false
                }
            },
            "detected_domain": { "type": "string" }
        },
        "required": ["flashcards", "detected_domain"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(domain: Option<&str>) -> GenerationRequest {
        GenerationRequest {
            text: "Photosynthesis converts light energy into chemical energy. ".repeat(3),
            domain: domain.map(str::to_string),
        }
    }

    #[test]
    fn supplied_domain_is_named_in_the_prompt() {
        let prompt = GenerationPrompt::for_request(&request(Some("Biology")));
        assert!(prompt.user.contains("\"Biology\""));
        assert!(!prompt.user.contains("automatically"));
    }

    #[test]
    fn missing_domain_asks_for_detection() {
        let prompt = GenerationPrompt::for_request(&request(None));
        assert!(prompt.user.contains("Detect the knowledge domain"));
    }

    #[test]
    fn prompt_embeds_fixed_requirements_and_source_text() {
        let req = request(None);
        let prompt = GenerationPrompt::for_request(&req);
        assert!(prompt.user.contains("same language as the source text"));
        assert!(prompt.user.contains("between 50 and 10000 characters"));
        assert!(prompt.user.contains("at most 500 characters"));
        assert!(prompt.user.contains("at least 3-5"));
        assert!(prompt.user.contains(&req.text));
        assert_eq!(prompt.temperature, 0.7);
        assert_eq!(prompt.max_tokens, 4000);
    }

    #[test]
    fn construction_is_deterministic() {
        let req = request(Some("Biology"));
        assert_eq!(GenerationPrompt::for_request(&req), GenerationPrompt::for_request(&req));
    }

    #[test]
    fn schema_requires_all_fields() {
        let schema = response_schema();
        assert_eq!(schema["required"], json!(["flashcards", "detected_domain"]));
        assert_eq!(
            schema["properties"]["flashcards"]["items"]["required"],
            json!(["question", "correct_answer", "domain"])
        );
    }
}
