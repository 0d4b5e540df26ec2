//! Service instance handlers

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

use broker_core::ProvisioningRequest;

use crate::api::error::ApiError;
use crate::api::handlers::{decode_body, path_ids, report_failure, AppState};
use crate::api::response::{BrokerResponse, EmptyResponse};

/// Response from provisioning
#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
    /// Management UI login link for the instance
    pub dashboard_url: String,
}

/// Provision a service instance
///
/// PUT /v2/service_instances/{instance_id}
pub async fn provision(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<BrokerResponse<ProvisionResponse>, ApiError> {
    let instance_id: String =
        path_ids(path).inspect_err(|e| report_failure("provision", "<invalid path>", e))?;
    let request = decode_body::<ProvisioningRequest>(body)
        .inspect_err(|e| report_failure("provision", &instance_id, e))?
        .for_instance(instance_id);

    info!(
        instance_id = %request.instance_id,
        service_id = %request.service_id,
        plan_id = %request.plan_id,
        "Provisioning service instance"
    );

    let dashboard_url = state
        .service
        .provision(&request)
        .await
        .inspect_err(|e| report_failure("provision", &request.instance_id, e))?;

    info!(instance_id = %request.instance_id, "Service instance provisioned");
    Ok(BrokerResponse::created(ProvisionResponse { dashboard_url }))
}

/// Deprovision a service instance
///
/// DELETE /v2/service_instances/{instance_id}
pub async fn deprovision(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<BrokerResponse<EmptyResponse>, ApiError> {
    let instance_id: String =
        path_ids(path).inspect_err(|e| report_failure("deprovision", "<invalid path>", e))?;
    let request = decode_body::<ProvisioningRequest>(body)
        .inspect_err(|e| report_failure("deprovision", &instance_id, e))?
        .for_instance(instance_id);

    info!(instance_id = %request.instance_id, "Deprovisioning service instance");

    state
        .service
        .deprovision(&request)
        .await
        .inspect_err(|e| report_failure("deprovision", &request.instance_id, e))?;

    info!(instance_id = %request.instance_id, "Service instance deprovisioned");
    Ok(BrokerResponse::ok(EmptyResponse {}))
}
