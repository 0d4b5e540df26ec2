//! Service binding handlers

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, State,
    },
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use broker_core::{BindingRequest, Credentials};

use crate::api::error::ApiError;
use crate::api::handlers::{decode_body, path_ids, report_failure, AppState};
use crate::api::response::{BrokerResponse, EmptyResponse};

/// Response from binding
#[derive(Debug, Serialize)]
pub struct BindResponse {
    /// Connection details for the application
    pub credentials: Credentials,

    /// Always empty
    pub syslog_drain_url: String,
}

/// Bind an application to a service instance
///
/// PUT /v2/service_instances/{instance_id}/service_bindings/{binding_id}
pub async fn bind(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<BrokerResponse<BindResponse>, ApiError> {
    let (instance_id, binding_id): (String, String) =
        path_ids(path).inspect_err(|e| report_failure("bind", "<invalid path>", e))?;
    let resource = format!("{}/{}", instance_id, binding_id);
    let request = decode_body::<BindingRequest>(body)
        .inspect_err(|e| report_failure("bind", &resource, e))?
        .for_binding(instance_id, binding_id);

    info!(
        instance_id = %request.instance_id,
        binding_id = %request.binding_id,
        app_guid = %request.app_id,
        "Binding service instance"
    );

    let binding = state
        .service
        .bind(&request)
        .await
        .inspect_err(|e| report_failure("bind", &resource, e))?;

    info!(
        instance_id = %request.instance_id,
        binding_id = %request.binding_id,
        "Service binding created"
    );
    Ok(BrokerResponse::created(BindResponse {
        credentials: binding.credentials,
        syslog_drain_url: binding.syslog_drain_url.unwrap_or_default(),
    }))
}

/// Remove a service binding
///
/// DELETE /v2/service_instances/{instance_id}/service_bindings/{binding_id}
pub async fn unbind(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<BrokerResponse<EmptyResponse>, ApiError> {
    let (instance_id, binding_id): (String, String) =
        path_ids(path).inspect_err(|e| report_failure("unbind", "<invalid path>", e))?;
    let resource = format!("{}/{}", instance_id, binding_id);
    let request = decode_body::<BindingRequest>(body)
        .inspect_err(|e| report_failure("unbind", &resource, e))?
        .for_binding(instance_id, binding_id);

    info!(
        instance_id = %request.instance_id,
        binding_id = %request.binding_id,
        "Removing service binding"
    );

    state
        .service
        .unbind(&request)
        .await
        .inspect_err(|e| report_failure("unbind", &resource, e))?;

    info!(
        instance_id = %request.instance_id,
        binding_id = %request.binding_id,
        "Service binding removed"
    );
    Ok(BrokerResponse::ok(EmptyResponse {}))
}
