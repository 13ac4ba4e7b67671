//! Clone-for-issuance service
//!
//! Re-registers a credential's metadata as a *new* schema/credential-
//! definition pair so a local test issuer can exercise it. The clone gets a
//! derived version (original suffixed with a UTC timestamp component) to
//! avoid colliding with the original on the ledger, and its results land in
//! the `cloned*` fields only. The original import and its registration state
//! are never touched, and a clone failure never pollutes the original's
//! error state.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::catalogue::record::{CatalogueCredential, CloneForIssuance, OperationLog};
use crate::catalogue::registration::{RegistrationCoordinator, RegistrationOutcome, RoundSpec};
use crate::clients::orbit::SchemaRegistration;
use crate::types::CuratorError;

/// User-supplied overrides for the derived clone metadata
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneOptions {
    pub schema_name: Option<String>,
    pub schema_version: Option<String>,
    pub cred_def_tag: Option<String>,
    pub support_revocation: Option<bool>,
}

/// One finished clone round: the group to persist (logs always retained,
/// ids only for the phases that succeeded) and the failure to report, if any.
#[derive(Debug)]
pub struct CloneRound {
    pub clone: CloneForIssuance,
    pub failure: Option<CuratorError>,
}

pub struct CloneForIssuanceService {
    coordinator: Arc<RegistrationCoordinator>,
}

impl CloneForIssuanceService {
    pub fn new(coordinator: Arc<RegistrationCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Derive the clone's registration spec from the original plus overrides.
    /// The default version keeps the dotted-numeric form so ledgers that
    /// validate version syntax accept it.
    pub fn derive_spec(
        record: &CatalogueCredential,
        options: &CloneOptions,
        now: DateTime<Utc>,
    ) -> RoundSpec {
        let name = options
            .schema_name
            .clone()
            .unwrap_or_else(|| record.schema_name.clone());
        let version = options
            .schema_version
            .clone()
            .unwrap_or_else(|| derive_version(&record.schema_version, now));

        RoundSpec {
            schema: SchemaRegistration {
                name,
                version,
                attributes: record.attributes.clone(),
                ledger: record.ledger.clone(),
            },
            cred_def_tag: options
                .cred_def_tag
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            support_revocation: options
                .support_revocation
                .unwrap_or(record.support_revocation),
            resume: None,
        }
    }

    /// Run a full clone round. Always returns a group worth persisting; the
    /// failure channel is separate so the caller can report it without
    /// touching the original registration fields.
    pub async fn run(&self, record: &CatalogueCredential, options: &CloneOptions) -> CloneRound {
        let now = Utc::now();
        let spec = Self::derive_spec(record, options, now);
        let name = spec.schema.name.clone();
        let version = spec.schema.version.clone();

        info!(
            credential = %record.id,
            clone_version = %version,
            "starting clone-for-issuance round"
        );

        let mut clone = CloneForIssuance {
            cloned_at: now,
            cloned_schema_name: name.clone(),
            cloned_schema_version: version.clone(),
            cloned_cred_def_tag: spec.cred_def_tag.clone(),
            cloned_ledger: None,
            cloned_schema_id: None,
            cloned_cred_def_id: None,
            cloned_orbit_schema_id: None,
            cloned_orbit_cred_def_id: None,
            cloned_orbit_schema_log: None,
            cloned_orbit_cred_def_log: None,
            enabled_for_issuance: false,
        };

        let failure = match self.coordinator.register_pair(spec).await {
            RegistrationOutcome::FullyRegistered {
                schema,
                cred_def,
                schema_log,
                cred_def_log,
            } => {
                clone.cloned_ledger = schema.ledger.or_else(|| Some(record.ledger.clone()));
                clone.cloned_schema_id = schema.schema_ledger_id;
                clone.cloned_orbit_schema_id = Some(schema.orbit_schema_id);
                clone.cloned_cred_def_id = cred_def.cred_def_ledger_id;
                clone.cloned_orbit_cred_def_id = Some(cred_def.orbit_cred_def_id);
                clone.cloned_orbit_schema_log = schema_log;
                clone.cloned_orbit_cred_def_log = Some(cred_def_log);
                None
            }
            RegistrationOutcome::SchemaFailed { schema_log } => {
                let failure = if is_collision(&schema_log) {
                    CuratorError::CloneCollision { name, version }
                } else {
                    CuratorError::Registration(Box::new(schema_log.clone()))
                };
                clone.cloned_orbit_schema_log = Some(schema_log);
                Some(failure)
            }
            RegistrationOutcome::CredDefFailed {
                schema,
                schema_log,
                cred_def_log,
            } => {
                clone.cloned_ledger = schema.ledger.or_else(|| Some(record.ledger.clone()));
                clone.cloned_schema_id = schema.schema_ledger_id;
                clone.cloned_orbit_schema_id = Some(schema.orbit_schema_id);
                clone.cloned_orbit_schema_log = schema_log;
                clone.cloned_orbit_cred_def_log = Some(cred_def_log.clone());
                Some(CuratorError::Registration(Box::new(cred_def_log)))
            }
        };

        CloneRound { clone, failure }
    }
}

/// `{original}.{yyMMddHHmmss}` keeps the version numeric-dotted and unique
/// across repeated cloning of the same record
fn derive_version(original: &str, now: DateTime<Utc>) -> String {
    format!("{}.{}", original, now.format("%y%m%d%H%M%S"))
}

/// Schema-phase diagnostics that mean the derived name/version is already
/// taken: a conflict status, or a registry message saying so
fn is_collision(log: &OperationLog) -> bool {
    if log.status_code == Some(409) {
        return true;
    }
    log.error_message
        .as_deref()
        .map(|message| {
            let message = message.to_lowercase();
            message.contains("exist") || message.contains("duplicate")
        })
        .unwrap_or(false)
}
