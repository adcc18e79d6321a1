//! crates/flashcards_core/src/generator.rs
//!
//! The flashcard generation pipeline. Steps run strictly in sequence:
//! prompt → model call → recovery → filtering → one bulk insert. Any failure
//! ends the request; nothing is retried here.

use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::{CallerIdentity, GenerationOutcome, GenerationRequest, NewProposal};
use crate::error::{preview, GenerationError};
use crate::parsing::parse_model_output;
use crate::ports::{FlashcardModelService, PortError, ProposalStore};
use crate::prompt::GenerationPrompt;
use crate::validation::accept_candidates;

/// Maximum number of characters of a store error body surfaced to the caller.
pub const STORE_ERROR_EXCERPT_CHARS: usize = 500;

/// Runs generation requests against a model service and a proposal store.
#[derive(Clone)]
pub struct FlashcardGenerator {
    model: Arc<dyn FlashcardModelService>,
    store: Arc<dyn ProposalStore>,
}

impl FlashcardGenerator {
    pub fn new(model: Arc<dyn FlashcardModelService>, store: Arc<dyn ProposalStore>) -> Self {
        Self { model, store }
    }

    /// Generates, filters and persists flashcard proposals for one request.
    pub async fn generate(
        &self,
        caller: &CallerIdentity,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let generation_session_id = Uuid::new_v4().to_string();
        info!(
            user_id = %caller.user_id,
            %generation_session_id,
            text_chars = request.text.chars().count(),
            domain = request.domain.as_deref().unwrap_or("<auto>"),
            "starting flashcard generation"
        );

        let prompt = GenerationPrompt::for_request(request);
        let content = self.model.complete(&prompt).await.map_err(model_error)?;
        debug!(%generation_session_id, content_chars = content.len(), "model responded");

        let output = parse_model_output(&content)?;
        let candidates = accept_candidates(
            &output.flashcards,
            output.detected_domain.as_deref(),
            request.domain.as_deref(),
        )?;
        info!(
            %generation_session_id,
            received = output.flashcards.len(),
            accepted = candidates.len(),
            "flashcard candidates filtered"
        );

        let rows: Vec<NewProposal> = candidates
            .into_iter()
            .map(|candidate| candidate.into_proposal(caller, &generation_session_id))
            .collect();

        let proposals = self
            .store
            .insert_proposals(caller, &rows)
            .await
            .map_err(store_error)?;
        info!(%generation_session_id, inserted = proposals.len(), "flashcard proposals saved");

        Ok(GenerationOutcome {
            generation_session_id,
            proposals,
            detected_domain: output.detected_domain.or_else(|| request.domain.clone()),
        })
    }

    /// Lists the proposals of an earlier generation session.
    pub async fn list_session_proposals(
        &self,
        caller: &CallerIdentity,
        generation_session_id: Uuid,
    ) -> Result<GenerationOutcome, GenerationError> {
        let session_id = generation_session_id.to_string();
        let proposals = self
            .store
            .list_proposals(caller, &session_id)
            .await
            .map_err(store_error)?;
        debug!(%session_id, count = proposals.len(), "listed flashcard proposals");

        let detected_domain = proposals.iter().find_map(|p| p.domain.clone());
        Ok(GenerationOutcome {
            generation_session_id: session_id,
            proposals,
            detected_domain,
        })
    }
}

/// Maps a model port failure onto the pipeline taxonomy.
fn model_error(err: PortError) -> GenerationError {
    error!("AI service call failed: {}", err);
    match err {
        PortError::Timeout(after) => GenerationError::AiTimeout(format!(
            "no response after {}; try again, possibly with a shorter text",
            after
        )),
        PortError::Network(message) => GenerationError::Network(message),
        PortError::Api { message, .. } | PortError::InvalidResponse(message) => {
            GenerationError::AiService(message)
        }
        PortError::EmptyResponse(message) => GenerationError::Parse {
            message: format!("AI response contained no content: {}", message),
            preview: String::new(),
        },
        PortError::Unexpected(message) => GenerationError::Internal(message),
    }
}

/// Maps a store port failure onto the pipeline taxonomy.
fn store_error(err: PortError) -> GenerationError {
    error!("record store call failed: {}", err);
    match err {
        PortError::Api {
            status: Some(status),
            message,
        } => GenerationError::Store {
            status,
            message: preview(&message, STORE_ERROR_EXCERPT_CHARS),
        },
        other => GenerationError::Internal(other.to_string()),
    }
}
