//! Ledger import endpoints
//!
//! Resolve explorer page URLs into parsed schema / credential-definition
//! metadata. These endpoints only read the ledger; nothing is persisted
//! until the caller submits the pair to POST /catalogue.
//!
//! - POST /import/schema {url} → ParsedSchema
//! - POST /import/creddef {url, schemaId} → ParsedCredDef

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::routes::{error_response, json_response, read_json_body};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSchemaRequest {
    /// Explorer page URL of the schema transaction
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCredDefRequest {
    /// Explorer page URL of the credential-definition transaction
    pub url: String,
    /// Schema the definition must reference (from the previous import step)
    pub schema_id: String,
}

/// Handle POST /import/schema
pub async fn handle_import_schema(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let request: ImportSchemaRequest = match read_json_body(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    info!(url = %request.url, "Importing schema from ledger");

    match state.parser.parse_schema(&request.url).await {
        Ok(schema) => json_response(StatusCode::OK, &schema),
        Err(e) => error_response(&e),
    }
}

/// Handle POST /import/creddef
pub async fn handle_import_cred_def(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let request: ImportCredDefRequest = match read_json_body(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    info!(
        url = %request.url,
        schema_id = %request.schema_id,
        "Importing credential definition from ledger"
    );

    match state
        .parser
        .parse_cred_def(&request.url, &request.schema_id)
        .await
    {
        Ok(cred_def) => json_response(StatusCode::OK, &cred_def),
        Err(e) => error_response(&e),
    }
}
