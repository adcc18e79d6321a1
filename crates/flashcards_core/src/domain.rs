//! crates/flashcards_core/src/domain.rs
//!
//! Defines the core data structures for flashcard generation.
//! Field names of the proposal rows match the record store's columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated generation request. Only produced by `GenerationRequest::parse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Source text, trimmed. At least `MIN_TEXT_CHARS` characters.
    pub text: String,
    /// Optional domain hint, trimmed and non-empty.
    pub domain: Option<String>,
}

/// The caller as read from a bearer token.
///
/// Nothing about this value is cryptographically trusted; see
/// `CallerIdentity::from_bearer_token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: String,
    /// The raw token, forwarded to the record store so it can enforce access.
    pub bearer_token: String,
}

/// A flashcard as proposed by the language model, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardCandidate {
    pub question: String,
    pub correct_answer: String,
    pub domain: Option<String>,
}

/// Review state of a proposal. Proposals are always created as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// A proposal row as sent to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProposal {
    pub user_id: String,
    pub question: String,
    pub correct_answer: String,
    pub image_url: Option<String>,
    pub domain: Option<String>,
    pub generation_session_id: String,
    pub status: ProposalStatus,
}

/// Server-assigned row identifier. The store may use integer or text keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// A proposal row as returned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredProposal {
    pub id: RecordId,
    pub question: String,
    pub correct_answer: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub status: ProposalStatus,
    #[serde(default)]
    pub generation_session_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The result of one successful pass through the generation pipeline.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub generation_session_id: String,
    pub proposals: Vec<StoredProposal>,
    pub detected_domain: Option<String>,
}

impl GenerationOutcome {
    /// Number of proposals actually persisted.
    pub fn total_generated(&self) -> usize {
        self.proposals.len()
    }
}
