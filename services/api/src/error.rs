//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! conversion into the JSON error envelope `{ "error": { code, message, details? } }`.

use crate::config::ConfigError;
use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flashcards_core::{ErrorCode, GenerationError};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required upstream secret is not configured.
    #[error("Server configuration error: {0} is not set")]
    MissingSecret(&'static str),

    /// Represents a failure of the generation pipeline.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The request body could not be buffered.
    #[error("Failed to read request body: {0}")]
    Body(#[from] BytesRejection),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// One of the stable error codes, e.g. `VALIDATION_ERROR`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Config(_) | ApiError::MissingSecret(_) => ErrorCode::ConfigurationError,
            ApiError::Generation(err) => err.code(),
            ApiError::Body(_) => ErrorCode::InvalidRequest,
            ApiError::Io(_) | ApiError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        if let ApiError::Generation(GenerationError::Store { status, .. }) = self {
            // The store's own rejection status is passed through.
            return StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        }
        if let ApiError::Body(rejection) = self {
            return rejection.status();
        }
        status_for(self.code())
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Generation(err) => err.details(),
            _ => None,
        }
    }
}

/// HTTP status used for each error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::InvalidRequest | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
        ErrorCode::AiServiceTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCode::NetworkError => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::AiServiceError | ErrorCode::ParseError => StatusCode::BAD_GATEWAY,
        ErrorCode::ConfigurationError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        if status.is_server_error() {
            error!(%code, %status, "request failed: {}", self);
        } else {
            warn!(%code, %status, "request rejected: {}", self);
        }

        let message = match &self {
            // Operator-facing detail stays in the logs.
            ApiError::Io(_) | ApiError::Internal(_) => "An unexpected internal error occurred".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.as_str().to_string(),
                message,
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}
