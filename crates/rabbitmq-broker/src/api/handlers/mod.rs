//! API request handlers

pub mod bindings;
pub mod catalog;
pub mod instances;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path,
    },
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, warn};

use broker_core::BrokerError;

use crate::config::BrokerCredentials;
use crate::service::BrokerService;

pub use bindings::{bind, unbind, BindResponse};
pub use catalog::get_catalog;
pub use instances::{deprovision, provision, ProvisionResponse};

/// Shared application state
pub struct AppState {
    /// Lifecycle operations
    pub service: Arc<dyn BrokerService>,

    /// Credentials every request must present
    pub auth: BrokerCredentials,
}

/// Identifiers from the route path
pub(crate) fn path_ids<T>(path: Result<Path<T>, PathRejection>) -> Result<T, BrokerError> {
    path.map(|Path(ids)| ids)
        .map_err(|rejection| BrokerError::Decode(rejection.body_text()))
}

/// Decode a JSON request body; an empty body yields the default request
pub(crate) fn decode_body<T: DeserializeOwned + Default>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, BrokerError> {
    let body = body.map_err(|rejection| BrokerError::Decode(rejection.body_text()))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Log a failed operation with the identifiers it concerned
pub(crate) fn report_failure(operation: &'static str, resource: &str, err: &BrokerError) {
    match err {
        BrokerError::Conflict(_) | BrokerError::Gone(_) | BrokerError::BadRequest(_) | BrokerError::Decode(_) => {
            warn!(operation, resource = %resource, error = %err, "Request rejected")
        }
        _ => error!(operation, resource = %resource, error = %err, "Request failed"),
    }
}
