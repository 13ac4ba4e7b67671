//! HTTP routes for Curator

pub mod catalogue;
pub mod health;
pub mod import;
pub mod tags;

pub use catalogue::{
    handle_clone_for_issuance, handle_create_catalogue, handle_delete_catalogue,
    handle_delete_clone, handle_get_catalogue, handle_list_catalogue, handle_list_issuable,
    handle_register, handle_set_issuable, handle_update_catalogue,
};
pub use health::{health_check, readiness_check, version_info};
pub use import::{handle_import_cred_def, handle_import_schema};
pub use tags::{handle_create_tag, handle_delete_tag, handle_list_tags};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::types::CuratorError;

/// HTTP status for each error variant. Parse and validation problems are the
/// caller's fault, collisions and preconditions map to 409, upstream
/// failures to 502.
fn status_for(error: &CuratorError) -> StatusCode {
    match error {
        CuratorError::UnsupportedUrl(_)
        | CuratorError::WrongTransactionType { .. }
        | CuratorError::MalformedTxn(_)
        | CuratorError::SchemaMismatch { .. }
        | CuratorError::Validation(_) => StatusCode::BAD_REQUEST,
        CuratorError::NotFound(_) => StatusCode::NOT_FOUND,
        CuratorError::DuplicateImport(_)
        | CuratorError::CloneCollision { .. }
        | CuratorError::NotCloned(_)
        | CuratorError::TagProtected(_) => StatusCode::CONFLICT,
        CuratorError::FetchFailed(_) | CuratorError::Registration(_) => StatusCode::BAD_GATEWAY,
        CuratorError::Database(_) | CuratorError::Io(_) | CuratorError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// JSON response with permissive CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(payload)
        .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Empty 204 response
pub fn no_content_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Error response: `{error}` body with the raw diagnostic preserved
pub fn error_response(error: &CuratorError) -> Response<Full<Bytes>> {
    let status = status_for(error);
    let body = match error {
        // Registration failures carry the full per-call log for diagnostics
        CuratorError::Registration(log) => serde_json::json!({
            "error": error.to_string(),
            "log": log,
        }),
        _ => serde_json::json!({ "error": error.to_string() }),
    };

    json_response(status, &body)
}

/// Read and parse a JSON request body. The `Err` side is the ready-to-send
/// 400 response.
pub async fn read_json_body<T: DeserializeOwned>(
    req: Request<Incoming>,
) -> Result<T, Response<Full<Bytes>>> {
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Request body error: {}", e);
            return Err(json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({ "error": "Failed to read request body" }),
            ));
        }
    };

    match serde_json::from_slice(&body) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Request JSON parse error: {}", e);
            Err(json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({ "error": format!("Invalid JSON: {}", e) }),
            ))
        }
    }
}

/// Like `read_json_body`, but an empty body parses as the default
pub async fn read_json_body_or_default<T: DeserializeOwned + Default>(
    req: Request<Incoming>,
) -> Result<T, Response<Full<Bytes>>> {
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Request body error: {}", e);
            return Err(json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({ "error": "Failed to read request body" }),
            ));
        }
    };

    if body.is_empty() {
        return Ok(T::default());
    }

    match serde_json::from_slice(&body) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Request JSON parse error: {}", e);
            Err(json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({ "error": format!("Invalid JSON: {}", e) }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_map_to_bad_request() {
        assert_eq!(
            status_for(&CuratorError::UnsupportedUrl("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&CuratorError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(
            status_for(&CuratorError::DuplicateImport("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CuratorError::NotCloned("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&CuratorError::TagProtected("x".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        assert_eq!(
            status_for(&CuratorError::FetchFailed("x".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
