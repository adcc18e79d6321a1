//! crates/flashcards_core/src/error.rs
//!
//! The error taxonomy of the generation pipeline. Every failure leaving the
//! pipeline is one of these variants, each with a stable external code.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Stable, externally visible error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ConfigurationError,
    Unauthorized,
    InvalidRequest,
    ValidationError,
    AiServiceTimeout,
    NetworkError,
    AiServiceError,
    ParseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::AiServiceTimeout => "AI_SERVICE_TIMEOUT",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::AiServiceError => "AI_SERVICE_ERROR",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure of the generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("AI service did not respond in time: {0}")]
    AiTimeout(String),

    #[error("Could not reach the AI service: {0}")]
    Network(String),

    #[error("AI service error: {0}")]
    AiService(String),

    #[error("{message}")]
    Parse { message: String, preview: String },

    /// The record store rejected the request. `status` is its HTTP status.
    #[error("Failed to save flashcard proposals: {message}")]
    Store { status: u16, message: String },

    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl GenerationError {
    pub fn validation(message: impl Into<String>) -> Self {
        GenerationError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: Value) -> Self {
        GenerationError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GenerationError::Unauthorized(_) => ErrorCode::Unauthorized,
            GenerationError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            GenerationError::Validation { .. } => ErrorCode::ValidationError,
            GenerationError::AiTimeout(_) => ErrorCode::AiServiceTimeout,
            GenerationError::Network(_) => ErrorCode::NetworkError,
            GenerationError::AiService(_) => ErrorCode::AiServiceError,
            GenerationError::Parse { .. } => ErrorCode::ParseError,
            GenerationError::Store { .. } | GenerationError::Internal(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Structured details for the caller, if the variant carries any.
    pub fn details(&self) -> Option<Value> {
        match self {
            GenerationError::Validation { details, .. } => details.clone(),
            GenerationError::Parse { preview, .. } => {
                Some(serde_json::json!({ "content_preview": preview }))
            }
            GenerationError::Store { status, message } => {
                Some(serde_json::json!({ "status": status, "store_error": message }))
            }
            _ => None,
        }
    }
}

/// Returns at most `max_chars` characters of `text`, marking truncation.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
