//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorBody, ErrorResponse};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::BytesRejection, Path, State},
    response::Json,
    Extension,
};
use bytes::Bytes;
use flashcards_core::{
    CallerIdentity, GenerationError, GenerationOutcome, GenerationRequest, ProposalStatus,
    RecordId, StoredProposal,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_flashcards_handler,
        list_session_proposals_handler,
        health_handler,
    ),
    components(
        schemas(
            GenerateFlashcardsRequest,
            GenerateFlashcardsResponse,
            SessionProposalsResponse,
            ProposalView,
            HealthResponse,
            ErrorResponse,
            ErrorBody,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Flashcards API", description = "Generate flashcard proposals from source text.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` security scheme used by the protected paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Request payload for flashcard generation.
///
/// The handler reads the raw body so that empty and malformed bodies are
/// reported as `INVALID_REQUEST`; this type carries the documented shape.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateFlashcardsRequest {
    /// Source text, at least 100 characters after trimming.
    pub text: Option<String>,
    /// Synonym for `text`, used when `text` is absent.
    pub source_text: Option<String>,
    /// Optional domain hint, at most 100 characters.
    pub domain: Option<String>,
}

/// A persisted proposal as returned to the caller.
#[derive(Serialize, ToSchema)]
pub struct ProposalView {
    /// Identifier assigned by the record store.
    #[schema(value_type = Object)]
    pub id: RecordId,
    pub question: String,
    pub correct_answer: String,
    pub domain: Option<String>,
    #[schema(value_type = String, example = "pending")]
    pub status: ProposalStatus,
}

impl From<StoredProposal> for ProposalView {
    fn from(row: StoredProposal) -> Self {
        Self {
            id: row.id,
            question: row.question,
            correct_answer: row.correct_answer,
            domain: row.domain,
            status: row.status,
        }
    }
}

/// The response payload sent after a successful generation.
#[derive(Serialize, ToSchema)]
pub struct GenerateFlashcardsResponse {
    pub generation_session_id: String,
    pub proposals: Vec<ProposalView>,
    pub detected_domain: Option<String>,
    pub total_generated: usize,
}

impl From<GenerationOutcome> for GenerateFlashcardsResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        let total_generated = outcome.total_generated();
        Self {
            generation_session_id: outcome.generation_session_id,
            proposals: outcome.proposals.into_iter().map(ProposalView::from).collect(),
            detected_domain: outcome.detected_domain,
            total_generated,
        }
    }
}

/// The proposals stamped with one generation session id.
#[derive(Serialize, ToSchema)]
pub struct SessionProposalsResponse {
    pub generation_session_id: String,
    pub proposals: Vec<ProposalView>,
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate flashcard proposals from source text.
///
/// Requires a bearer token. The token payload supplies the caller id and the
/// token itself is forwarded to the record store.
#[utoipa::path(
    post,
    path = "/api/generate-flashcards",
    request_body = GenerateFlashcardsRequest,
    responses(
        (status = 200, description = "Proposals generated and saved", body = GenerateFlashcardsResponse),
        (status = 400, description = "INVALID_REQUEST or VALIDATION_ERROR", body = ErrorResponse),
        (status = 401, description = "UNAUTHORIZED", body = ErrorResponse),
        (status = 500, description = "CONFIGURATION_ERROR or INTERNAL_ERROR", body = ErrorResponse),
        (status = 502, description = "AI_SERVICE_ERROR or PARSE_ERROR", body = ErrorResponse),
        (status = 503, description = "NETWORK_ERROR", body = ErrorResponse),
        (status = 504, description = "AI_SERVICE_TIMEOUT", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_flashcards_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<GenerateFlashcardsResponse>, ApiError> {
    let body = body?;
    let generator = state.generator()?;
    let request = GenerationRequest::parse(&body)?;
    let outcome = generator.generate(&caller, &request).await?;
    Ok(Json(outcome.into()))
}

/// List the proposals created by one generation request.
#[utoipa::path(
    get,
    path = "/api/generation-sessions/{session_id}/proposals",
    params(
        ("session_id" = Uuid, Path, description = "The generation session id returned by generation.")
    ),
    responses(
        (status = 200, description = "Proposals of the session", body = SessionProposalsResponse),
        (status = 400, description = "VALIDATION_ERROR", body = ErrorResponse),
        (status = 401, description = "UNAUTHORIZED", body = ErrorResponse),
        (status = 500, description = "CONFIGURATION_ERROR or INTERNAL_ERROR", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_session_proposals_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionProposalsResponse>, ApiError> {
    let generator = state.generator()?;
    let session_id = Uuid::parse_str(&session_id).map_err(|_| {
        GenerationError::validation_with(
            "Field 'generation_session_id' must be a UUID",
            json!({ "field": "generation_session_id" }),
        )
    })?;

    let outcome = generator.list_session_proposals(&caller, session_id).await?;
    let proposals: Vec<ProposalView> = outcome.proposals.into_iter().map(ProposalView::from).collect();
    Ok(Json(SessionProposalsResponse {
        generation_session_id: outcome.generation_session_id,
        total: proposals.len(),
        proposals,
    }))
}

/// Liveness probe. No authentication required.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_request_shape_matches_accepted_bodies() {
        let body = br#"{"source_text":"  some source text  ","domain":"Biology"}"#;
        let documented: GenerateFlashcardsRequest = serde_json::from_slice(body).unwrap();
        assert_eq!(documented.text, None);
        assert_eq!(documented.source_text.as_deref(), Some("  some source text  "));
        assert_eq!(documented.domain.as_deref(), Some("Biology"));

        // The same keys reach the pipeline's own parser.
        let err = GenerationRequest::parse(body).unwrap_err();
        assert_eq!(err.code(), flashcards_core::ErrorCode::ValidationError);
    }

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for route in [
            "/api/generate-flashcards",
            "/api/generation-sessions/{session_id}/proposals",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(route), "missing {}", route);
        }
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("GenerateFlashcardsRequest"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
