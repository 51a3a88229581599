pub mod config;
pub mod error;
pub mod issuer;
pub mod routes;

use axum::Router;
use axum::routing::get;
use echoes_core::Catalog;
use issuer::SignedUrlIssuer;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared, read-only state of the broker.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub agent_id: Option<String>,
    pub has_api_key: bool,
    pub issuer: Arc<dyn SignedUrlIssuer>,
}

pub fn app(state: AppState) -> Router {
    // Permissive CORS so a separately hosted frontend can call the broker.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/conversation",
            get(routes::health).post(routes::request_session),
        )
        .route("/api/topics", get(routes::list_topics))
        .route("/api/topics/{id}", get(routes::get_topic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
