//! crates/flashcards_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The generation pipeline talks to the language model and the record store
//! only through these traits, so the core stays independent of HTTP clients.

use async_trait::async_trait;

use crate::domain::{CallerIdentity, NewProposal, StoredProposal};
use crate::prompt::GenerationPrompt;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// Adapters classify their client-specific failures into these variants.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Request timed out after {0}")]
    Timeout(String),
    #[error("Network failure: {0}")]
    Network(String),
    /// The remote service answered with a non-success status.
    #[error("Remote service returned an error: {message}")]
    Api { status: Option<u16>, message: String },
    /// The remote service answered successfully but the body had an unusable shape.
    #[error("Remote service returned an unusable response: {0}")]
    InvalidResponse(String),
    #[error("Remote service returned no content: {0}")]
    EmptyResponse(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait FlashcardModelService: Send + Sync {
    /// Runs a schema-constrained completion and returns the first choice's
    /// message content, unparsed.
    async fn complete(&self, prompt: &GenerationPrompt) -> PortResult<String>;
}

#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Inserts the whole batch in one request and returns the created rows.
    /// The caller's token is forwarded; the store enforces access control.
    async fn insert_proposals(
        &self,
        caller: &CallerIdentity,
        proposals: &[NewProposal],
    ) -> PortResult<Vec<StoredProposal>>;

    /// Lists the proposals stamped with a generation session id.
    async fn list_proposals(
        &self,
        caller: &CallerIdentity,
        generation_session_id: &str,
    ) -> PortResult<Vec<StoredProposal>>;
}
