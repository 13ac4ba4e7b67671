//! Catalogue endpoints
//!
//! CRUD over imported credentials plus the registration, clone-for-issuance
//! and issuance-toggle actions. All handlers delegate to `CatalogueService`;
//! this layer only shapes requests and responses.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::catalogue::builder::ImportInput;
use crate::catalogue::cloning::CloneOptions;
use crate::catalogue::parser::{ParsedCredDef, ParsedSchema};
use crate::catalogue::record::{CatalogueCredential, OperationLog};
use crate::catalogue::service::ClassificationUpdate;
use crate::routes::{
    error_response, json_response, no_content_response, read_json_body, read_json_body_or_default,
};
use crate::server::AppState;
use crate::types::CuratorError;

// ============================================================================
// Request/response types
// ============================================================================

/// POST /catalogue request: the parsed pair from the import endpoints plus
/// the classification chosen by the operator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCatalogueRequest {
    pub schema_data: ParsedSchema,
    pub cred_def_data: ParsedCredDef,
    pub ecosystem_tag_id: String,
    #[serde(default)]
    pub issuer_name: Option<String>,
    #[serde(default)]
    pub issuer_did: Option<String>,
    #[serde(default)]
    pub issuer_entity_id: Option<String>,
    #[serde(default)]
    pub schema_source_url: Option<String>,
    #[serde(default)]
    pub cred_def_source_url: Option<String>,
    #[serde(default)]
    pub register_with_orbit: bool,
    #[serde(default = "default_imported_by")]
    pub imported_by: String,
}

fn default_imported_by() -> String {
    "admin".to_string()
}

/// PATCH /catalogue/{id}/issuable request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuableRequest {
    pub enabled: bool,
}

/// POST /catalogue/{id}/clone-for-issuance response: the clone group of the
/// updated record, with the failure (if any) inlined.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloned_ledger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloned_schema_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloned_cred_def_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloned_orbit_schema_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloned_orbit_cred_def_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_log: Option<OperationLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_def_log: Option<OperationLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CloneResponse {
    fn from_record(record: &CatalogueCredential, failure: Option<&CuratorError>) -> Self {
        let group = record.clone_for_issuance.as_ref();
        Self {
            cloned_ledger: group.and_then(|g| g.cloned_ledger.clone()),
            cloned_schema_id: group.and_then(|g| g.cloned_schema_id.clone()),
            cloned_cred_def_id: group.and_then(|g| g.cloned_cred_def_id.clone()),
            cloned_orbit_schema_id: group.and_then(|g| g.cloned_orbit_schema_id.clone()),
            cloned_orbit_cred_def_id: group.and_then(|g| g.cloned_orbit_cred_def_id.clone()),
            schema_log: group.and_then(|g| g.cloned_orbit_schema_log.clone()),
            cred_def_log: group.and_then(|g| g.cloned_orbit_cred_def_log.clone()),
            error: failure.map(|e| e.to_string()),
        }
    }
}

// ============================================================================
// CRUD handlers
// ============================================================================

/// Handle POST /catalogue
pub async fn handle_create_catalogue(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let request: CreateCatalogueRequest = match read_json_body(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    info!(
        schema_id = %request.schema_data.schema_id,
        cred_def_id = %request.cred_def_data.cred_def_id,
        register = request.register_with_orbit,
        "Adding credential to catalogue"
    );

    let input = ImportInput {
        schema: request.schema_data,
        cred_def: request.cred_def_data,
        ecosystem_tag: request.ecosystem_tag_id,
        issuer_name: request.issuer_name,
        issuer_did: request.issuer_did,
        issuer_entity_id: request.issuer_entity_id,
        schema_source_url: request.schema_source_url,
        cred_def_source_url: request.cred_def_source_url,
        imported_by: request.imported_by,
    };

    match state.service.import(input, request.register_with_orbit).await {
        Ok(record) => json_response(StatusCode::CREATED, &record),
        Err(e) => error_response(&e),
    }
}

/// Handle GET /catalogue
pub async fn handle_list_catalogue(state: Arc<AppState>) -> Response<Full<Bytes>> {
    match state.service.list_credentials().await {
        Ok(records) => json_response(StatusCode::OK, &records),
        Err(e) => error_response(&e),
    }
}

/// Handle GET /catalogue/{id}
pub async fn handle_get_catalogue(state: Arc<AppState>, id: &str) -> Response<Full<Bytes>> {
    match state.service.get_credential(id).await {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => error_response(&e),
    }
}

/// Handle PATCH /catalogue/{id}
pub async fn handle_update_catalogue(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<Full<Bytes>> {
    let update: ClassificationUpdate = match read_json_body(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match state.service.update_classification(id, update).await {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => error_response(&e),
    }
}

/// Handle DELETE /catalogue/{id}
pub async fn handle_delete_catalogue(state: Arc<AppState>, id: &str) -> Response<Full<Bytes>> {
    match state.service.delete_credential(id).await {
        Ok(()) => no_content_response(),
        Err(e) => error_response(&e),
    }
}

// ============================================================================
// Registration and clone handlers
// ============================================================================

/// Handle POST /catalogue/{id}/register
///
/// Retries a failed or partial registration, resuming after an already
/// registered schema. The updated record is returned either way; a failed
/// round lands in its logs, not in the HTTP status.
pub async fn handle_register(state: Arc<AppState>, id: &str) -> Response<Full<Bytes>> {
    info!(credential_id = %id, "Registration retry requested");

    match state.service.retry_registration(id).await {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(e) => error_response(&e),
    }
}

/// Handle POST /catalogue/{id}/clone-for-issuance
///
/// Re-registers the pair under a derived schema version so this tenant can
/// issue against it. A name/version collision maps to 409; a registry
/// failure is reported inside the 200 response, with the failed attempt's
/// logs persisted on the record.
pub async fn handle_clone_for_issuance(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<Full<Bytes>> {
    let options: CloneOptions = match read_json_body_or_default(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    info!(credential_id = %id, "Clone for issuance requested");

    match state.service.clone_for_issuance(id, options).await {
        Ok((record, failure)) => {
            let response = CloneResponse::from_record(&record, failure.as_ref());
            let status = match failure {
                Some(CuratorError::CloneCollision { .. }) => StatusCode::CONFLICT,
                _ => StatusCode::OK,
            };
            json_response(status, &response)
        }
        Err(e) => error_response(&e),
    }
}

/// Handle DELETE /catalogue/{id}/clone
pub async fn handle_delete_clone(state: Arc<AppState>, id: &str) -> Response<Full<Bytes>> {
    info!(credential_id = %id, "Clone removal requested");

    match state.service.delete_clone(id).await {
        Ok(_) => no_content_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle PATCH /catalogue/{id}/issuable
pub async fn handle_set_issuable(
    req: Request<Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<Full<Bytes>> {
    let request: IssuableRequest = match read_json_body(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match state.service.set_issuance(id, request.enabled).await {
        Ok(_) => no_content_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle GET /catalogue/issuable
pub async fn handle_list_issuable(state: Arc<AppState>) -> Response<Full<Bytes>> {
    match state.service.list_issuable().await {
        Ok(records) => json_response(StatusCode::OK, &records),
        Err(e) => error_response(&e),
    }
}
