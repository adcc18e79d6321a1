pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::require_bearer;
pub use rest::{generate_flashcards_handler, health_handler, list_session_proposals_handler};

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router, including the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/api/generate-flashcards", post(generate_flashcards_handler))
        .route(
            "/api/generation-sessions/{session_id}/proposals",
            get(list_session_proposals_handler),
        )
        .route_layer(axum_middleware::from_fn(require_bearer));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Source text has no upper bound, so axum's default body cap is lifted.
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
