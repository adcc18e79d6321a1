//! services/api/src/adapters/store.rs
//!
//! The record store adapter: a PostgREST-style REST interface (e.g. Supabase
//! `rest/v1`). It implements the `ProposalStore` port and never applies any
//! access rules itself; the caller's bearer token is forwarded on every request.

use std::time::Duration;

use async_trait::async_trait;
use flashcards_core::{
    domain::{CallerIdentity, NewProposal, StoredProposal},
    ports::{PortError, PortResult, ProposalStore},
};
use reqwest::{header::HeaderValue, RequestBuilder, Response};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A REST adapter that implements the `ProposalStore` port.
#[derive(Clone)]
pub struct RestProposalStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RestProposalStore {
    /// Creates a new `RestProposalStore` for `{base_url}/rest/v1/{table}`.
    pub fn new(base_url: &str, api_key: &str, table: &str) -> PortResult<Self> {
        HeaderValue::from_str(api_key)
            .map_err(|e| PortError::Unexpected(format!("invalid store API key: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Adds the store key and the caller's own token.
    fn authorized(&self, builder: RequestBuilder, caller: &CallerIdentity) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&caller.bearer_token)
    }
}

/// Turns a non-success response into `PortError::Api`, keeping the status.
async fn check_status(response: Response) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PortError::Api {
        status: Some(status.as_u16()),
        message: if body.is_empty() {
            status.to_string()
        } else {
            body
        },
    })
}

fn transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout(e.to_string())
    } else {
        PortError::Network(e.to_string())
    }
}

//=========================================================================================
// `ProposalStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProposalStore for RestProposalStore {
    async fn insert_proposals(
        &self,
        caller: &CallerIdentity,
        proposals: &[NewProposal],
    ) -> PortResult<Vec<StoredProposal>> {
        debug!(count = proposals.len(), table = %self.table, "inserting proposals");
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(proposals);

        let response = self
            .authorized(request, caller)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)
            .await?
            .json::<Vec<StoredProposal>>()
            .await
            .map_err(|e| PortError::InvalidResponse(e.to_string()))
    }

    async fn list_proposals(
        &self,
        caller: &CallerIdentity,
        generation_session_id: &str,
    ) -> PortResult<Vec<StoredProposal>> {
        let request = self.client.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("generation_session_id", format!("eq.{}", generation_session_id)),
            ("order", "id.asc".to_string()),
        ]);

        let response = self
            .authorized(request, caller)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)
            .await?
            .json::<Vec<StoredProposal>>()
            .await
            .map_err(|e| PortError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashcards_core::domain::{ProposalStatus, RecordId};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn caller() -> CallerIdentity {
        CallerIdentity {
            user_id: "user-1".to_string(),
            bearer_token: "header.payload.sig".to_string(),
        }
    }

    fn proposal() -> NewProposal {
        NewProposal {
            user_id: "user-1".to_string(),
            question: "What is the powerhouse of the cell according to biology?".to_string(),
            correct_answer: "The mitochondria".to_string(),
            image_url: None,
            domain: Some("Biology".to_string()),
            generation_session_id: "session-1".to_string(),
            status: ProposalStatus::Pending,
        }
    }

    #[tokio::test]
    async fn insert_forwards_token_and_requests_representation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/flashcard_proposals"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer header.payload.sig"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!([{
                "user_id": "user-1",
                "question": "What is the powerhouse of the cell according to biology?",
                "correct_answer": "The mitochondria",
                "image_url": null,
                "domain": "Biology",
                "generation_session_id": "session-1",
                "status": "pending"
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": 7,
                "user_id": "user-1",
                "question": "What is the powerhouse of the cell according to biology?",
                "correct_answer": "The mitochondria",
                "image_url": null,
                "domain": "Biology",
                "generation_session_id": "session-1",
                "status": "pending",
                "created_at": "2024-05-01T12:00:00.123456+00:00"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let store = RestProposalStore::new(&server.uri(), "anon-key", "flashcard_proposals").unwrap();
        let rows = store.insert_proposals(&caller(), &[proposal()]).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, RecordId::Number(7));
        assert_eq!(rows[0].status, ProposalStatus::Pending);
        assert!(rows[0].created_at.is_some());
    }

    #[tokio::test]
    async fn insert_rejection_keeps_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "message": "new row violates row-level security policy"
            })))
            .mount(&server)
            .await;

        let store = RestProposalStore::new(&server.uri(), "anon-key", "flashcard_proposals").unwrap();
        let err = store.insert_proposals(&caller(), &[proposal()]).await.unwrap_err();

        match err {
            PortError::Api { status, message } => {
                assert_eq!(status, Some(403));
                assert!(message.contains("row-level security"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn list_filters_by_session_and_accepts_text_ids() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/flashcard_proposals"))
            .and(query_param("generation_session_id", "eq.session-1"))
            .and(header("authorization", "Bearer header.payload.sig"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "0b6b7a5e-4f3c-4d0e-9a55-3c1c8f0f2a11",
                "question": "What is the powerhouse of the cell according to biology?",
                "correct_answer": "The mitochondria",
                "domain": null,
                "status": "accepted"
            }])))
            .mount(&server)
            .await;

        let store = RestProposalStore::new(&server.uri(), "anon-key", "flashcard_proposals").unwrap();
        let rows = store.list_proposals(&caller(), "session-1").await.unwrap();

        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0].id, RecordId::Text(_)));
        assert_eq!(rows[0].status, ProposalStatus::Accepted);
    }

    #[tokio::test]
    async fn unusable_body_is_an_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
            .mount(&server)
            .await;

        let store = RestProposalStore::new(&server.uri(), "anon-key", "flashcard_proposals").unwrap();
        let err = store.insert_proposals(&caller(), &[proposal()]).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidResponse(_)));
    }
}
