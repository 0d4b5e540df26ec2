//! API module for the service broker

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;

use axum::{
    http::Uri,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use error::ApiError;
use handlers::AppState;
use response::BrokerResponse;

pub use middleware::{API_VERSION_HEADER, REQUEST_TARGET};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> BrokerResponse<HealthResponse> {
    BrokerResponse::ok(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Layers run bottom-up: version check, then authentication, then routing
    let broker_api = Router::new()
        .route("/v2/catalog", get(handlers::get_catalog))
        .route(
            "/v2/service_instances/{instance_id}",
            put(handlers::provision).delete(handlers::deprovision),
        )
        .route(
            "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
            put(handlers::bind).delete(handlers::unbind),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(from_fn_with_state(Arc::clone(&state), middleware::authenticate))
        .layer(from_fn(middleware::check_api_version));

    Router::new()
        .route("/health", get(health))
        .merge(broker_api)
        .layer(from_fn(middleware::capture_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
