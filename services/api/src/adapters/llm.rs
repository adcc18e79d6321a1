//! services/api/src/adapters/llm.rs
//!
//! This module contains the adapter for the flashcard-generating LLM.
//! It implements the `FlashcardModelService` port from the `core` crate against
//! any OpenAI-compatible chat-completion gateway.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use flashcards_core::{
    ports::{FlashcardModelService, PortError, PortResult},
    prompt::GenerationPrompt,
};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FlashcardModelService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFlashcardAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiFlashcardAdapter {
    /// Creates a new `OpenAiFlashcardAdapter`.
    ///
    /// `timeout` bounds the whole call.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }

    /// Builds a client for the gateway at `api_base` (e.g. `https://openrouter.ai/api/v1`).
    ///
    /// The client never retries: a 5xx or 429 from the gateway surfaces as an
    /// API error on the first attempt instead of running into the timeout.
    pub fn client_for(api_base: &str, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Client::with_config(config).with_backoff(no_retry())
    }
}

//=========================================================================================
// `FlashcardModelService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FlashcardModelService for OpenAiFlashcardAdapter {
    /// Requests schema-constrained flashcards and returns the raw message content.
    async fn complete(&self, prompt: &GenerationPrompt) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt.system.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.user.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: prompt.schema_name.clone(),
                schema: Some(prompt.schema.clone()),
                strict: Some(true),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(prompt.temperature)
            .max_tokens(prompt.max_tokens)
            .response_format(response_format)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, timeout = ?self.timeout, "calling AI service");
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| PortError::Timeout(format!("{:?}", self.timeout)))?
            .map_err(classify_error)?;

        // Extract the text content from the first choice in the response.
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            PortError::EmptyResponse("AI service returned no choices".to_string())
        })?;

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(PortError::EmptyResponse(
                "AI service response contained no message content".to_string(),
            )),
        }
    }
}

/// A backoff policy whose elapsed-time budget is spent before the first retry.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..ExponentialBackoff::default()
    }
}

/// Sorts client failures into timeout, transport, API and shape errors.
fn classify_error(err: OpenAIError) -> PortError {
    match err {
        OpenAIError::Reqwest(e) if e.is_timeout() => PortError::Timeout(e.to_string()),
        OpenAIError::Reqwest(e) => PortError::Network(e.to_string()),
        OpenAIError::ApiError(api) => PortError::Api {
            status: None,
            message: api.message,
        },
        err @ OpenAIError::JSONDeserialize(..) => PortError::InvalidResponse(err.to_string()),
        other => PortError::Unexpected(other.to_string()),
    }
}
