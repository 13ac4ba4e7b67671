//! Catalogue credential record
//!
//! The central entity of the catalogue: one imported schema +
//! credential-definition pair, its registry registration state, and an
//! optional issuance clone. Serialized camelCase on the wire and stored as-is
//! in MongoDB.
//!
//! The clone fields live in a single `CloneForIssuance` struct flattened into
//! the wire shape, so the all-or-nothing invariant (either no clone attempt,
//! or one self-consistent attempt) holds by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::orbit::RegistryExchange;

// ============================================================================
// Operation logs
// ============================================================================

/// One attempted call against the credential registry.
///
/// Captured for every registration phase, success or failure. `error_message`
/// carries the registry's parsed JSON `message` field for HTTP failures, or
/// the transport error when the registry was unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OperationLog {
    /// Build a log entry from a captured registry exchange
    pub fn from_exchange(exchange: &RegistryExchange) -> Self {
        Self {
            success: exchange.is_success(),
            status_code: exchange.status_code,
            request_url: Some(exchange.url.clone()),
            request_payload: Some(exchange.request_payload.clone()),
            response_body: exchange.response_body.clone(),
            error_message: exchange.error_message(),
            timestamp: Utc::now(),
        }
    }

    /// Short human-readable summary for error display and logging
    pub fn describe(&self) -> String {
        match (self.status_code, &self.error_message) {
            (Some(code), Some(msg)) => format!("HTTP {}: {}", code, msg),
            (Some(code), None) => format!("HTTP {}", code),
            (None, Some(msg)) => msg.clone(),
            (None, None) => {
                if self.success {
                    "ok".to_string()
                } else {
                    "unknown failure".to_string()
                }
            }
        }
    }
}

// ============================================================================
// Clone group
// ============================================================================

/// Issuance clone of a credential's schema/credential-definition pair.
///
/// Created by a second registration round against derived metadata. A failed
/// attempt is still recorded (logs retained, ids absent) so the user can see
/// what happened; `enabled_for_issuance` only ever becomes true once the
/// clone's credential definition exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneForIssuance {
    pub cloned_at: DateTime<Utc>,
    pub cloned_schema_name: String,
    pub cloned_schema_version: String,
    pub cloned_cred_def_tag: String,
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
    pub cloned_orbit_schema_log: Option<OperationLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloned_orbit_cred_def_log: Option<OperationLog>,
    #[serde(default)]
    pub enabled_for_issuance: bool,
}

impl CloneForIssuance {
    /// True when the clone round produced a usable credential definition
    pub fn is_usable(&self) -> bool {
        self.cloned_cred_def_id.is_some()
    }
}

// ============================================================================
// Credential record
// ============================================================================

/// A catalogued credential: imported ledger metadata, classification, registry
/// registration state, and (optionally) an issuance clone.
///
/// `schema_id`/`cred_def_id` identify the original ledger artifacts and are
/// never mutated after import. Registration fields are written only by the
/// registration coordinator, clone fields only by the clone service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueCredential {
    pub id: String,

    // Original ledger identity
    pub schema_id: String,
    pub schema_name: String,
    pub schema_version: String,
    pub attributes: Vec<String>,
    pub cred_def_id: String,
    pub cred_def_tag: String,
    #[serde(default)]
    pub support_revocation: bool,
    pub ledger: String,

    // Classification
    pub ecosystem_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_entity_id: Option<String>,

    // Provenance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_def_source_url: Option<String>,
    pub imported_at: DateTime<Utc>,
    pub imported_by: String,

    // Registry registration (original pair)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbit_schema_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbit_cred_def_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbit_schema_log: Option<OperationLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbit_cred_def_log: Option<OperationLog>,

    // Issuance clone (all-or-nothing group, flattened on the wire; a None
    // group emits no fields at all)
    #[serde(flatten)]
    pub clone_for_issuance: Option<CloneForIssuance>,

    // Legacy single-error shape written by earlier versions. Read and
    // surfaced as a structured log by normalized(); never written back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbit_registration_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orbit_registration_error_details: Option<Value>,
}

impl CatalogueCredential {
    /// Both registry ids present for the original pair
    pub fn is_fully_registered(&self) -> bool {
        self.orbit_schema_id.is_some() && self.orbit_cred_def_id.is_some()
    }

    /// A clone round has been attempted (successful or not)
    pub fn has_clone_attempt(&self) -> bool {
        self.clone_for_issuance.is_some()
    }

    /// The clone exists and produced a usable credential definition
    pub fn is_cloned(&self) -> bool {
        self.clone_for_issuance
            .as_ref()
            .map(CloneForIssuance::is_usable)
            .unwrap_or(false)
    }

    /// Whether the clone is currently exposed to the issuance catalog
    pub fn issuance_enabled(&self) -> bool {
        self.clone_for_issuance
            .as_ref()
            .map(|c| c.enabled_for_issuance)
            .unwrap_or(false)
    }

    /// Migrate the legacy single-error shape into a structured log, in memory
    /// only. The stored document is left untouched; the error lands on the
    /// phase that failed (schema when no registry schema id exists, otherwise
    /// the credential definition).
    pub fn normalized(mut self) -> Self {
        let legacy = self.orbit_registration_error.take();
        let details = self.orbit_registration_error_details.take();

        if let Some(message) = legacy {
            if self.orbit_schema_log.is_none() && self.orbit_cred_def_log.is_none() {
                let log = OperationLog {
                    success: false,
                    status_code: None,
                    request_url: None,
                    request_payload: None,
                    response_body: details.map(|d| d.to_string()),
                    error_message: Some(message),
                    timestamp: self.imported_at,
                };
                if self.orbit_schema_id.is_none() {
                    self.orbit_schema_log = Some(log);
                } else {
                    self.orbit_cred_def_log = Some(log);
                }
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_record() -> CatalogueCredential {
        CatalogueCredential {
            id: "c-1".to_string(),
            schema_id: "NcYxi:2:BC Person:1.0".to_string(),
            schema_name: "BC Person".to_string(),
            schema_version: "1.0".to_string(),
            attributes: vec!["given_name".to_string(), "family_name".to_string()],
            cred_def_id: "NcYxi:3:CL:42:default".to_string(),
            cred_def_tag: "default".to_string(),
            support_revocation: false,
            ledger: "candy-test".to_string(),
            ecosystem_tag: "bc-gov".to_string(),
            issuer_name: None,
            issuer_did: None,
            issuer_entity_id: None,
            schema_source_url: None,
            cred_def_source_url: None,
            imported_at: Utc::now(),
            imported_by: "admin".to_string(),
            orbit_schema_id: None,
            orbit_cred_def_id: None,
            orbit_schema_log: None,
            orbit_cred_def_log: None,
            clone_for_issuance: None,
            orbit_registration_error: None,
            orbit_registration_error_details: None,
        }
    }

    #[test]
    fn clone_fields_absent_from_wire_when_not_cloned() {
        let value = serde_json::to_value(base_record()).unwrap();
        assert!(value.get("clonedAt").is_none());
        assert!(value.get("enabledForIssuance").is_none());
        assert_eq!(value["schemaName"], "BC Person");
    }

    #[test]
    fn clone_fields_flatten_to_top_level() {
        let mut record = base_record();
        record.clone_for_issuance = Some(CloneForIssuance {
            cloned_at: Utc::now(),
            cloned_schema_name: "BC Person".to_string(),
            cloned_schema_version: "1.0.250101120000".to_string(),
            cloned_cred_def_tag: "default".to_string(),
            cloned_ledger: Some("candy-test".to_string()),
            cloned_schema_id: Some("NcYxi:2:BC Person:1.0.250101120000".to_string()),
            cloned_cred_def_id: Some("NcYxi:3:CL:77:default".to_string()),
            cloned_orbit_schema_id: Some("901".to_string()),
            cloned_orbit_cred_def_id: Some("902".to_string()),
            cloned_orbit_schema_log: None,
            cloned_orbit_cred_def_log: None,
            enabled_for_issuance: false,
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["clonedSchemaVersion"], "1.0.250101120000");
        assert_eq!(value["enabledForIssuance"], false);

        let back: CatalogueCredential = serde_json::from_value(value).unwrap();
        assert!(back.is_cloned());
        assert!(!back.issuance_enabled());
    }

    #[test]
    fn issuance_never_enabled_without_clone() {
        let record = base_record();
        assert!(!record.issuance_enabled());
        assert!(!record.is_cloned());
    }

    #[test]
    fn legacy_error_surfaces_as_schema_log() {
        let mut record = base_record();
        record.orbit_registration_error = Some("registry rejected schema".to_string());
        record.orbit_registration_error_details = Some(json!({"code": 400}));

        let normalized = record.normalized();
        let log = normalized.orbit_schema_log.expect("schema log");
        assert!(!log.success);
        assert_eq!(
            log.error_message.as_deref(),
            Some("registry rejected schema")
        );
        assert!(normalized.orbit_registration_error.is_none());
        assert!(normalized.orbit_cred_def_log.is_none());
    }

    #[test]
    fn legacy_error_lands_on_cred_def_phase_when_schema_registered() {
        let mut record = base_record();
        record.orbit_schema_id = Some("812".to_string());
        record.orbit_registration_error = Some("cred def rejected".to_string());

        let normalized = record.normalized();
        assert!(normalized.orbit_schema_log.is_none());
        let log = normalized.orbit_cred_def_log.expect("cred def log");
        assert_eq!(log.error_message.as_deref(), Some("cred def rejected"));
    }

    #[test]
    fn normalized_prefers_existing_structured_logs() {
        let mut record = base_record();
        record.orbit_schema_log = Some(OperationLog {
            success: false,
            status_code: Some(400),
            request_url: None,
            request_payload: None,
            response_body: None,
            error_message: Some("structured".to_string()),
            timestamp: Utc::now(),
        });
        record.orbit_registration_error = Some("legacy".to_string());

        let normalized = record.normalized();
        let log = normalized.orbit_schema_log.expect("schema log");
        assert_eq!(log.error_message.as_deref(), Some("structured"));
    }
}
