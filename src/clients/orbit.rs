//! Credential registry client ("Orbit")
//!
//! The registry exposes two registration endpoints: `POST {base}/schemas` and
//! `POST {base}/credential-definitions`. Every call is captured as a
//! `RegistryExchange` whether it succeeded or not; the coordinator turns these
//! captures into per-phase operation logs on the credential record. Failures
//! are data here, never errors.
//!
//! ## Response contract
//!
//! Successful schema registration returns `schemaId` (the registry's own
//! identifier) plus `schemaLedgerId` and `ledger` (where the registry anchored
//! its copy). Credential-definition registration returns
//! `credentialDefinitionId` and `credentialDefinitionLedgerId`. Numeric and
//! string identifiers are both accepted.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::types::{CuratorError, Result};

// ============================================================================
// Requests and captured exchanges
// ============================================================================

/// Schema registration request (phase one)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistration {
    pub name: String,
    pub version: String,
    pub attributes: Vec<String>,
    pub ledger: String,
}

/// Credential-definition registration request (phase two). `schema_id` is the
/// registry schema id returned by phase one, never the ledger schema id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredDefRegistration {
    pub schema_id: String,
    pub tag: String,
    pub support_revocation: bool,
}

/// One captured registry call: what was sent, what came back.
///
/// `status_code` is absent exactly when the request never completed at the
/// HTTP level; `error` then carries the transport failure.
#[derive(Debug, Clone)]
pub struct RegistryExchange {
    pub url: String,
    pub status_code: Option<u16>,
    pub request_payload: Value,
    pub response_body: Option<String>,
    pub error: Option<String>,
}

impl RegistryExchange {
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }

    /// Response body parsed as JSON, when it is JSON
    pub fn response_json(&self) -> Option<Value> {
        self.response_body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }

    /// The diagnostic for a failed call: the transport error when the request
    /// never completed, otherwise the registry's JSON `message` field.
    /// Successful calls and non-JSON failure bodies yield nothing (the raw
    /// body is retained separately).
    pub fn error_message(&self) -> Option<String> {
        if let Some(transport) = &self.error {
            return Some(transport.clone());
        }
        if self.is_success() {
            return None;
        }
        self.response_json()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
    }

    /// Extract an identifier field from the response, accepting both string
    /// and numeric JSON values
    pub fn response_field(&self, key: &str) -> Option<String> {
        let value = self.response_json()?;
        match value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// Registry trait
// ============================================================================

/// Registration endpoints of the credential registry.
///
/// Implementations never return errors: transport failures are folded into
/// the returned exchange so callers always have a full capture to log.
#[async_trait]
pub trait CredentialRegistry: Send + Sync {
    async fn register_schema(&self, registration: &SchemaRegistration) -> RegistryExchange;
    async fn register_cred_def(&self, registration: &CredDefRegistration) -> RegistryExchange;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// Orbit registry client over HTTP
pub struct OrbitClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OrbitClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| CuratorError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post(&self, path: &str, payload: Value) -> RegistryExchange {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.post(&url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                debug!(url = %url, status = status, "registry call completed");
                RegistryExchange {
                    url,
                    status_code: Some(status),
                    request_payload: payload,
                    response_body: Some(body),
                    error: None,
                }
            }
            Err(e) => {
                debug!(url = %url, error = %e, "registry call failed at transport level");
                RegistryExchange {
                    url,
                    status_code: None,
                    request_payload: payload,
                    response_body: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[async_trait]
impl CredentialRegistry for OrbitClient {
    async fn register_schema(&self, registration: &SchemaRegistration) -> RegistryExchange {
        let payload = serde_json::to_value(registration).unwrap_or_else(|_| json!({}));
        self.post("/schemas", payload).await
    }

    async fn register_cred_def(&self, registration: &CredDefRegistration) -> RegistryExchange {
        let payload = serde_json::to_value(registration).unwrap_or_else(|_| json!({}));
        self.post("/credential-definitions", payload).await
    }
}

// ============================================================================
// In-process implementation (dev mode)
// ============================================================================

/// Dev-mode registry that fabricates identifiers without any network calls.
/// Lets the full import and clone flow run locally when no Orbit instance is
/// configured.
pub struct InProcessRegistry {
    next_id: AtomicU64,
    ledger: String,
    anchor_did: String,
}

impl InProcessRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ledger: "in-process".to_string(),
            anchor_did: "LocalDevRegistry111111".to_string(),
        }
    }
}

impl Default for InProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialRegistry for InProcessRegistry {
    async fn register_schema(&self, registration: &SchemaRegistration) -> RegistryExchange {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let body = json!({
            "schemaId": id,
            "schemaLedgerId": format!(
                "{}:2:{}:{}",
                self.anchor_did, registration.name, registration.version
            ),
            "ledger": self.ledger,
        });
        RegistryExchange {
            url: "in-process:/schemas".to_string(),
            status_code: Some(200),
            request_payload: serde_json::to_value(registration).unwrap_or_else(|_| json!({})),
            response_body: Some(body.to_string()),
            error: None,
        }
    }

    async fn register_cred_def(&self, registration: &CredDefRegistration) -> RegistryExchange {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let body = json!({
            "credentialDefinitionId": id,
            "credentialDefinitionLedgerId": format!(
                "{}:3:CL:{}:{}",
                self.anchor_did, registration.schema_id, registration.tag
            ),
        });
        RegistryExchange {
            url: "in-process:/credential-definitions".to_string(),
            status_code: Some(200),
            request_payload: serde_json::to_value(registration).unwrap_or_else(|_| json!({})),
            response_body: Some(body.to_string()),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange_with_body(status: u16, body: &str) -> RegistryExchange {
        RegistryExchange {
            url: "http://registry/schemas".to_string(),
            status_code: Some(status),
            request_payload: json!({}),
            response_body: Some(body.to_string()),
            error: None,
        }
    }

    #[test]
    fn error_message_prefers_transport_error() {
        let exchange = RegistryExchange {
            url: "http://registry/schemas".to_string(),
            status_code: None,
            request_payload: json!({}),
            response_body: None,
            error: Some("connection refused".to_string()),
        };
        assert_eq!(exchange.error_message().as_deref(), Some("connection refused"));
        assert!(!exchange.is_success());
    }

    #[test]
    fn error_message_parses_json_message_field() {
        let exchange = exchange_with_body(400, r#"{"message":"duplicate schema"}"#);
        assert_eq!(exchange.error_message().as_deref(), Some("duplicate schema"));
    }

    #[test]
    fn error_message_absent_for_success_and_non_json() {
        assert_eq!(exchange_with_body(200, r#"{"schemaId":1}"#).error_message(), None);
        assert_eq!(exchange_with_body(500, "internal failure").error_message(), None);
    }

    #[test]
    fn response_field_accepts_numbers_and_strings() {
        let numeric = exchange_with_body(200, r#"{"schemaId":42}"#);
        assert_eq!(numeric.response_field("schemaId").as_deref(), Some("42"));

        let string = exchange_with_body(200, r#"{"schemaId":"ORB-S1"}"#);
        assert_eq!(string.response_field("schemaId").as_deref(), Some("ORB-S1"));
    }

    #[tokio::test]
    async fn in_process_registry_assigns_distinct_ids() {
        let registry = InProcessRegistry::new();
        let schema = SchemaRegistration {
            name: "BC Person".to_string(),
            version: "1.0".to_string(),
            attributes: vec!["given_name".to_string()],
            ledger: "candy-test".to_string(),
        };

        let first = registry.register_schema(&schema).await;
        let second = registry.register_schema(&schema).await;
        assert!(first.is_success());
        assert_ne!(
            first.response_field("schemaId"),
            second.response_field("schemaId")
        );
    }
}
