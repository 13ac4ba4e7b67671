//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection, and a
//! `match (method, path)` router over the catalogue surface.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::catalogue::parser::LedgerReferenceParser;
use crate::catalogue::service::CatalogueService;
use crate::config::Args;
use crate::routes;
use crate::types::CuratorError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Catalogue pipeline: import, registration, cloning, issuance
    pub service: Arc<CatalogueService>,
    /// Ledger reference parser (explorer-backed)
    pub parser: Arc<LedgerReferenceParser>,
    /// Whether MongoDB connected at startup (false means in-memory fallback)
    pub mongo_connected: bool,
    /// Active registry backend: 'orbit' or 'in-process'
    pub registry_mode: &'static str,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        service: Arc<CatalogueService>,
        parser: Arc<LedgerReferenceParser>,
        mongo_connected: bool,
        registry_mode: &'static str,
    ) -> Self {
        Self {
            args,
            service,
            parser,
            mongo_connected,
            registry_mode,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), CuratorError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Curator listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Readiness probe
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        // ====================================================================
        // Ledger import (parse only, nothing persisted)
        // ====================================================================
        (Method::POST, "/import/schema") => {
            routes::handle_import_schema(req, Arc::clone(&state)).await
        }
        (Method::POST, "/import/creddef") => {
            routes::handle_import_cred_def(req, Arc::clone(&state)).await
        }

        // ====================================================================
        // Ecosystem tags (fixed paths before the /catalogue/{id} arms)
        // ====================================================================
        (Method::GET, "/catalogue/tags") => routes::handle_list_tags(Arc::clone(&state)).await,
        (Method::POST, "/catalogue/tags") => {
            routes::handle_create_tag(req, Arc::clone(&state)).await
        }
        (Method::DELETE, p) if p.starts_with("/catalogue/tags/") => {
            let id = p.strip_prefix("/catalogue/tags/").unwrap_or("");
            routes::handle_delete_tag(Arc::clone(&state), id).await
        }

        // Issuance catalog view
        (Method::GET, "/catalogue/issuable") => {
            routes::handle_list_issuable(Arc::clone(&state)).await
        }

        // ====================================================================
        // Catalogue collection
        // ====================================================================
        (Method::GET, "/catalogue") => routes::handle_list_catalogue(Arc::clone(&state)).await,
        (Method::POST, "/catalogue") => {
            routes::handle_create_catalogue(req, Arc::clone(&state)).await
        }

        // ====================================================================
        // Per-credential actions
        // ====================================================================
        (Method::POST, p) if p.starts_with("/catalogue/") && p.ends_with("/register") => {
            let id = action_id(p, "/register").to_string();
            routes::handle_register(Arc::clone(&state), &id).await
        }
        (Method::POST, p)
            if p.starts_with("/catalogue/") && p.ends_with("/clone-for-issuance") =>
        {
            let id = action_id(p, "/clone-for-issuance").to_string();
            routes::handle_clone_for_issuance(req, Arc::clone(&state), &id).await
        }
        (Method::DELETE, p) if p.starts_with("/catalogue/") && p.ends_with("/clone") => {
            let id = action_id(p, "/clone").to_string();
            routes::handle_delete_clone(Arc::clone(&state), &id).await
        }
        (Method::PATCH, p) if p.starts_with("/catalogue/") && p.ends_with("/issuable") => {
            let id = action_id(p, "/issuable").to_string();
            routes::handle_set_issuable(req, Arc::clone(&state), &id).await
        }

        // ====================================================================
        // Per-credential CRUD
        // ====================================================================
        (Method::GET, p) if credential_id(p).is_some() => {
            let id = credential_id(p).unwrap_or("").to_string();
            routes::handle_get_catalogue(Arc::clone(&state), &id).await
        }
        (Method::PATCH, p) if credential_id(p).is_some() => {
            let id = credential_id(p).unwrap_or("").to_string();
            routes::handle_update_catalogue(req, Arc::clone(&state), &id).await
        }
        (Method::DELETE, p) if credential_id(p).is_some() => {
            let id = credential_id(p).unwrap_or("").to_string();
            routes::handle_delete_catalogue(Arc::clone(&state), &id).await
        }

        // Not found
        _ => not_found_response(&path),
    };

    Ok(response)
}

/// Extract {id} from a `/catalogue/{id}` path with a single segment
fn credential_id(path: &str) -> Option<&str> {
    let id = path.strip_prefix("/catalogue/")?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id)
}

/// Extract {id} from `/catalogue/{id}{action}`
fn action_id<'a>(path: &'a str, action: &str) -> &'a str {
    path.strip_prefix("/catalogue/")
        .and_then(|s| s.strip_suffix(action))
        .unwrap_or("")
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PATCH, DELETE, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_id_requires_a_single_segment() {
        assert_eq!(credential_id("/catalogue/abc-123"), Some("abc-123"));
        assert_eq!(credential_id("/catalogue/"), None);
        assert_eq!(credential_id("/catalogue/a/b"), None);
        assert_eq!(credential_id("/health"), None);
    }

    #[test]
    fn action_id_strips_prefix_and_action() {
        assert_eq!(action_id("/catalogue/abc/register", "/register"), "abc");
        assert_eq!(
            action_id("/catalogue/abc/clone-for-issuance", "/clone-for-issuance"),
            "abc"
        );
        assert_eq!(action_id("/catalogue/abc/clone", "/clone"), "abc");
    }
}
