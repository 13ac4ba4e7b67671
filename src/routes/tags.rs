//! Ecosystem tag endpoints
//!
//! - GET /catalogue/tags → predefined + custom tags
//! - POST /catalogue/tags {name} → created tag
//! - DELETE /catalogue/tags/{id} → 204 | 409 for predefined tags

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::routes::{error_response, json_response, no_content_response, read_json_body};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

/// Handle GET /catalogue/tags
pub async fn handle_list_tags(state: Arc<AppState>) -> Response<Full<Bytes>> {
    match state.service.list_tags().await {
        Ok(tags) => json_response(StatusCode::OK, &tags),
        Err(e) => error_response(&e),
    }
}

/// Handle POST /catalogue/tags
pub async fn handle_create_tag(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let request: CreateTagRequest = match read_json_body(req).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    info!(name = %request.name, "Creating ecosystem tag");

    match state.service.create_tag(&request.name).await {
        Ok(tag) => json_response(StatusCode::CREATED, &tag),
        Err(e) => error_response(&e),
    }
}

/// Handle DELETE /catalogue/tags/{id}
pub async fn handle_delete_tag(state: Arc<AppState>, id: &str) -> Response<Full<Bytes>> {
    match state.service.delete_tag(id).await {
        Ok(()) => no_content_response(),
        Err(e) => error_response(&e),
    }
}
