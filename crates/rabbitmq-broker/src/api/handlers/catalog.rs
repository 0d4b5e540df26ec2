//! Catalog handler

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::handlers::AppState;
use crate::api::response::BrokerResponse;

/// Advertise the offered services and plans
///
/// GET /v2/catalog
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Response {
    let catalog = state.service.catalog();
    BrokerResponse::ok(catalog.as_ref()).into_response()
}
