//! crates/flashcards_core/src/identity.rs
//!
//! Reads the caller id out of a JWT-shaped bearer token.
//!
//! SECURITY: the token signature is NOT verified. The payload is only decoded
//! and inspected. Access control is left to the record store, which receives
//! the caller's token with every request.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::domain::CallerIdentity;
use crate::error::GenerationError;

/// Scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Payload claims that may carry the caller id, in priority order.
const ID_CLAIMS: [&str; 3] = ["sub", "user_id", "id"];

impl CallerIdentity {
    /// Builds an identity from a full `Authorization` header value.
    pub fn from_authorization_header(header: Option<&str>) -> Result<Self, GenerationError> {
        let token = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .ok_or_else(|| {
                GenerationError::Unauthorized(
                    "Missing or invalid Authorization header".to_string(),
                )
            })?;
        Self::from_bearer_token(token.trim())
    }

    /// Decodes a three-segment token and extracts the caller id from its payload.
    pub fn from_bearer_token(token: &str) -> Result<Self, GenerationError> {
        let user_id = extract_user_id(token).ok_or_else(|| {
            GenerationError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(Self {
            user_id,
            bearer_token: token.to_string(),
        })
    }
}

fn extract_user_id(token: &str) -> Option<String> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        tracing::debug!(segments = segments.len(), "bearer token is not a three-part token");
        return None;
    }

    let payload = decode_segment(segments[1])?;
    let claims: Value = serde_json::from_str(&payload).ok()?;

    ID_CLAIMS.iter().find_map(|claim| {
        claims
            .get(claim)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    })
}

/// Base64url-decodes a segment into UTF-8 text by restoring the standard
/// alphabet and padding.
fn decode_segment(segment: &str) -> Option<String> {
    let mut standard: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }
    let bytes = STANDARD.decode(standard).ok()?;
    String::from_utf8(bytes).ok()
}
