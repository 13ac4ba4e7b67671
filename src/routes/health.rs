//! Health check endpoints
//!
//! Kubernetes-style probes:
//! - /health, /healthz - liveness (is the service running?)
//! - /ready, /readyz - readiness (can it serve catalogue traffic?)
//!
//! Liveness always returns 200 while the process is up. Readiness requires a
//! connected MongoDB unless dev mode is enabled, where the in-memory store
//! fallback keeps the service usable without one.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Health response for probes and the operator UI
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// 'online' when the backing store is usable, 'degraded' otherwise
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: String,
    /// Backing store status
    pub store: StoreHealth,
    /// Credential registry status
    pub registry: RegistryHealth,
    /// Degradation detail when the store fell back to memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Backing store details
#[derive(Serialize)]
pub struct StoreHealth {
    /// Whether MongoDB is connected
    pub connected: bool,
    /// Active backend: 'mongodb' or 'memory'
    pub backend: &'static str,
}

/// Credential registry details
#[derive(Serialize)]
pub struct RegistryHealth {
    /// Whether a registry endpoint is configured
    pub configured: bool,
    /// Active registry: 'orbit' or 'in-process'
    pub mode: &'static str,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let args = &state.args;

    let error = if !state.mongo_connected && args.dev_mode {
        Some("Dev mode: MongoDB not connected - catalogue is in-memory only".to_string())
    } else {
        None
    };

    let status = if state.mongo_connected || args.dev_mode {
        "online"
    } else {
        "degraded"
    };

    HealthResponse {
        healthy: true,
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        store: StoreHealth {
            connected: state.mongo_connected,
            backend: if state.mongo_connected {
                "mongodb"
            } else {
                "memory"
            },
        },
        registry: RegistryHealth {
            configured: args.orbit_api_url.is_some(),
            mode: state.registry_mode,
        },
        error,
    }
}

/// Handle liveness probe (/health, /healthz)
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"healthy":true,"error":"Serialization failed"}"#.to_string());

    // Liveness probe: always return 200 if service is running
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Handle readiness probe (/ready, /readyz)
///
/// Returns 200 only when the catalogue can actually be served: MongoDB in
/// production, any store in dev mode.
pub fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);

    let is_ready = state.mongo_connected || state.args.dev_mode;

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"healthy":false,"error":"Serialization failed"}"#.to_string());

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "curator",
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"version":"unknown","commit":"unknown"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
