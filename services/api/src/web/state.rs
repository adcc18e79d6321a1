//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{OpenAiFlashcardAdapter, RestProposalStore};
use crate::config::Config;
use crate::error::ApiError;
use flashcards_core::{FlashcardGenerator, FlashcardModelService, ProposalStore};
use std::sync::Arc;
use tracing::warn;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when an upstream secret is missing from the configuration.
    generator: Option<FlashcardGenerator>,
}

impl AppState {
    /// Builds the state with explicit adapters.
    pub fn new(
        config: Arc<Config>,
        model: Arc<dyn FlashcardModelService>,
        store: Arc<dyn ProposalStore>,
    ) -> Self {
        Self {
            config,
            generator: Some(FlashcardGenerator::new(model, store)),
        }
    }

    /// Builds the state and the production adapters from the configuration.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ApiError> {
        let secrets = (
            config.llm_api_key.clone(),
            config.store_url.clone(),
            config.store_api_key.clone(),
        );
        let (Some(llm_api_key), Some(store_url), Some(store_api_key)) = secrets else {
            warn!(
                missing = config.missing_secret().unwrap_or_default(),
                "upstream secrets are not configured; generation requests will fail"
            );
            return Ok(Self {
                config,
                generator: None,
            });
        };

        let client = OpenAiFlashcardAdapter::client_for(&config.llm_api_base, &llm_api_key);
        let model = Arc::new(OpenAiFlashcardAdapter::new(
            client,
            config.llm_model.clone(),
            config.llm_timeout,
        ));
        let store = Arc::new(
            RestProposalStore::new(&store_url, &store_api_key, &config.proposals_table)
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        );

        Ok(Self::new(config, model, store))
    }

    /// The generation pipeline, or `CONFIGURATION_ERROR` if it cannot run.
    pub fn generator(&self) -> Result<&FlashcardGenerator, ApiError> {
        match &self.generator {
            Some(generator) => Ok(generator),
            None => Err(ApiError::MissingSecret(
                self.config.missing_secret().unwrap_or("LLM_API_KEY"),
            )),
        }
    }
}
