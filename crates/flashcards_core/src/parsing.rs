//! crates/flashcards_core/src/parsing.rs
//!
//! Recovers the structured flashcard payload from raw model content.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{preview, GenerationError};

/// Maximum number of characters of model content echoed back in parse errors.
pub const CONTENT_PREVIEW_CHARS: usize = 200;

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json|JSON)?").expect("opening fence pattern is valid"));

static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```$").expect("closing fence pattern is valid"));

/// The model payload after structural checks, before per-item filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub flashcards: Vec<Value>,
    pub detected_domain: Option<String>,
}

/// Removes a leading ```json / ``` fence and a trailing ``` fence.
///
/// Each side is stripped on its own, so an unclosed fence is handled too.
/// Content without a fence is returned trimmed.
pub fn strip_code_fence(content: &str) -> &str {
    let mut inner = content.trim();
    if let Some(opening) = OPENING_FENCE.find(inner) {
        inner = inner[opening.end()..].trim_start();
    }
    if let Some(closing) = CLOSING_FENCE.find(inner) {
        inner = inner[..closing.start()].trim_end();
    }
    inner
}

/// Parses model content into a `ModelOutput`.
pub fn parse_model_output(content: &str) -> Result<ModelOutput, GenerationError> {
    let json_text = strip_code_fence(content);

    let value: Value = serde_json::from_str(json_text).map_err(|e| GenerationError::Parse {
        message: format!("Failed to parse AI response as JSON: {}", e),
        preview: preview(content, CONTENT_PREVIEW_CHARS),
    })?;

    let flashcards = match value.get("flashcards") {
        Some(Value::Array(items)) => items.clone(),
        _ => {
            return Err(GenerationError::Parse {
                message: "AI response is missing the 'flashcards' array".to_string(),
                preview: preview(content, CONTENT_PREVIEW_CHARS),
            })
        }
    };

    let detected_domain = value
        .get("detected_domain")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(ModelOutput {
        flashcards,
        detected_domain,
    })
}
