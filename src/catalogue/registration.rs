//! Registry registration coordinator
//!
//! Drives the two-phase registration of a schema/credential-definition pair
//! against the credential registry. The phases are strictly sequential: the
//! credential-definition endpoint is never called unless the schema phase
//! succeeded, because the registry needs the schema id returned by phase one.
//!
//! ## Phases
//!
//! ```text
//! Pending --schema ok--> SchemaRegistered --cred def ok--> FullyRegistered
//!    |                        |
//!    +--schema fails-->       +--cred def fails-->
//!       SchemaFailed             CredDefFailed
//! ```
//!
//! Every call is captured as an `OperationLog` regardless of outcome, and a
//! failed round is a normal return value, never an error: the caller persists
//! whatever happened so the user can retry later.
//!
//! The same core (`register_pair`) drives both the original import round and
//! the issuance-clone round; the two differ only in where their results are
//! written.

use std::sync::Arc;
use tracing::{info, warn};

use crate::catalogue::record::{CatalogueCredential, OperationLog};
use crate::clients::orbit::{CredDefRegistration, CredentialRegistry, SchemaRegistration};

// ============================================================================
// Round inputs and outputs
// ============================================================================

/// Identifiers returned by a successful schema phase
#[derive(Debug, Clone)]
pub struct RegisteredSchema {
    pub orbit_schema_id: String,
    /// Where the registry anchored its copy, when reported
    pub schema_ledger_id: Option<String>,
    pub ledger: Option<String>,
}

/// Identifiers returned by a successful credential-definition phase
#[derive(Debug, Clone)]
pub struct RegisteredCredDef {
    pub orbit_cred_def_id: String,
    pub cred_def_ledger_id: Option<String>,
}

/// A previously successful schema phase to resume past. Re-running a round
/// with a resume point skips the schema call entirely.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    pub orbit_schema_id: String,
    pub schema_ledger_id: Option<String>,
    pub ledger: Option<String>,
}

/// One registration round: what to register and where to pick up
#[derive(Debug, Clone)]
pub struct RoundSpec {
    pub schema: SchemaRegistration,
    pub cred_def_tag: String,
    pub support_revocation: bool,
    pub resume: Option<ResumePoint>,
}

/// Outcome of a registration round. `schema_log` is `None` exactly when the
/// schema phase was skipped on resume; the persisted log from the earlier
/// round then stays in place.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    FullyRegistered {
        schema: RegisteredSchema,
        cred_def: RegisteredCredDef,
        schema_log: Option<OperationLog>,
        cred_def_log: OperationLog,
    },
    SchemaFailed {
        schema_log: OperationLog,
    },
    CredDefFailed {
        schema: RegisteredSchema,
        schema_log: Option<OperationLog>,
        cred_def_log: OperationLog,
    },
}

impl RegistrationOutcome {
    /// The log of the phase that failed, when one did. The
    /// credential-definition failure is the primary diagnostic even though
    /// the schema phase succeeded before it.
    pub fn failure_log(&self) -> Option<&OperationLog> {
        match self {
            RegistrationOutcome::FullyRegistered { .. } => None,
            RegistrationOutcome::SchemaFailed { schema_log } => Some(schema_log),
            RegistrationOutcome::CredDefFailed { cred_def_log, .. } => Some(cred_def_log),
        }
    }
}

// ============================================================================
// Phase derived from a stored record
// ============================================================================

/// Registration state of a credential's original pair, derived from the
/// persisted record rather than tracked separately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPhase {
    Pending,
    SchemaRegistered,
    FullyRegistered,
    SchemaFailed,
    CredDefFailed,
}

impl RegistrationPhase {
    pub fn of(record: &CatalogueCredential) -> Self {
        match (&record.orbit_schema_id, &record.orbit_cred_def_id) {
            (Some(_), Some(_)) => RegistrationPhase::FullyRegistered,
            (Some(_), None) => {
                let cred_def_failed = record
                    .orbit_cred_def_log
                    .as_ref()
                    .map(|log| !log.success)
                    .unwrap_or(false);
                if cred_def_failed {
                    RegistrationPhase::CredDefFailed
                } else {
                    RegistrationPhase::SchemaRegistered
                }
            }
            (None, _) => {
                let schema_failed = record
                    .orbit_schema_log
                    .as_ref()
                    .map(|log| !log.success)
                    .unwrap_or(false);
                if schema_failed {
                    RegistrationPhase::SchemaFailed
                } else {
                    RegistrationPhase::Pending
                }
            }
        }
    }
}

// ============================================================================
// Coordinator
// ============================================================================

pub struct RegistrationCoordinator {
    registry: Arc<dyn CredentialRegistry>,
}

impl RegistrationCoordinator {
    pub fn new(registry: Arc<dyn CredentialRegistry>) -> Self {
        Self { registry }
    }

    /// Run a registration round for a credential's original pair.
    ///
    /// Idempotent on retry: a record whose schema phase already succeeded
    /// resumes at the credential-definition phase with the persisted schema
    /// id, and the schema endpoint is not called again.
    pub async fn register(&self, record: &CatalogueCredential) -> RegistrationOutcome {
        let resume = record
            .orbit_schema_id
            .clone()
            .map(|orbit_schema_id| ResumePoint {
                orbit_schema_id,
                schema_ledger_id: None,
                ledger: None,
            });

        self.register_pair(RoundSpec {
            schema: SchemaRegistration {
                name: record.schema_name.clone(),
                version: record.schema_version.clone(),
                attributes: record.attributes.clone(),
                ledger: record.ledger.clone(),
            },
            cred_def_tag: record.cred_def_tag.clone(),
            support_revocation: record.support_revocation,
            resume,
        })
        .await
    }

    /// The generic two-phase core. Both the import round and the clone round
    /// drive this; they differ only in the `RoundSpec` they pass and where
    /// they write the outcome.
    pub async fn register_pair(&self, spec: RoundSpec) -> RegistrationOutcome {
        // Phase one: schema
        let (schema, schema_log) = match spec.resume {
            Some(point) => {
                info!(
                    orbit_schema_id = %point.orbit_schema_id,
                    "schema already registered, resuming at credential definition"
                );
                (
                    RegisteredSchema {
                        orbit_schema_id: point.orbit_schema_id,
                        schema_ledger_id: point.schema_ledger_id,
                        ledger: point.ledger,
                    },
                    None,
                )
            }
            None => {
                let exchange = self.registry.register_schema(&spec.schema).await;
                let mut log = OperationLog::from_exchange(&exchange);

                if !exchange.is_success() {
                    warn!(
                        name = %spec.schema.name,
                        version = %spec.schema.version,
                        status = ?exchange.status_code,
                        "registry schema registration failed"
                    );
                    return RegistrationOutcome::SchemaFailed { schema_log: log };
                }

                let Some(orbit_schema_id) = exchange.response_field("schemaId") else {
                    log.success = false;
                    log.error_message =
                        Some("registry response did not include schemaId".to_string());
                    return RegistrationOutcome::SchemaFailed { schema_log: log };
                };

                info!(
                    orbit_schema_id = %orbit_schema_id,
                    name = %spec.schema.name,
                    "schema registered with registry"
                );

                (
                    RegisteredSchema {
                        orbit_schema_id,
                        schema_ledger_id: exchange.response_field("schemaLedgerId"),
                        ledger: exchange.response_field("ledger"),
                    },
                    Some(log),
                )
            }
        };

        // Phase two: credential definition, bound to the schema id from
        // phase one
        let registration = CredDefRegistration {
            schema_id: schema.orbit_schema_id.clone(),
            tag: spec.cred_def_tag,
            support_revocation: spec.support_revocation,
        };
        let exchange = self.registry.register_cred_def(&registration).await;
        let mut cred_def_log = OperationLog::from_exchange(&exchange);

        if !exchange.is_success() {
            warn!(
                orbit_schema_id = %schema.orbit_schema_id,
                status = ?exchange.status_code,
                "registry credential-definition registration failed"
            );
            return RegistrationOutcome::CredDefFailed {
                schema,
                schema_log,
                cred_def_log,
            };
        }

        let Some(orbit_cred_def_id) = exchange.response_field("credentialDefinitionId") else {
            cred_def_log.success = false;
            cred_def_log.error_message =
                Some("registry response did not include credentialDefinitionId".to_string());
            return RegistrationOutcome::CredDefFailed {
                schema,
                schema_log,
                cred_def_log,
            };
        };

        info!(
            orbit_schema_id = %schema.orbit_schema_id,
            orbit_cred_def_id = %orbit_cred_def_id,
            "credential definition registered with registry"
        );

        RegistrationOutcome::FullyRegistered {
            schema,
            cred_def: RegisteredCredDef {
                orbit_cred_def_id,
                cred_def_ledger_id: exchange.response_field("credentialDefinitionLedgerId"),
            },
            schema_log,
            cred_def_log,
        }
    }
}
