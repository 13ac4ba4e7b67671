//! Issuance eligibility gate
//!
//! Tracks which credentials are exposed to the downstream issuance catalog.
//! Only a usable clone (one whose credential definition exists) can be
//! enabled, and a fresh clone always starts disabled:
//!
//! ```text
//! NotCloned -[clone]-> Cloned(disabled) <-[toggle]-> Cloned(enabled)
//! Cloned(*) -[delete clone]-> NotCloned
//! ```

use crate::catalogue::record::CatalogueCredential;
use crate::types::{CuratorError, Result};

/// Issuance state derived from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceState {
    NotCloned,
    Cloned { enabled: bool },
}

impl IssuanceState {
    pub fn of(record: &CatalogueCredential) -> Self {
        match &record.clone_for_issuance {
            Some(clone) if clone.is_usable() => IssuanceState::Cloned {
                enabled: clone.enabled_for_issuance,
            },
            _ => IssuanceState::NotCloned,
        }
    }
}

pub struct IssuanceEligibilityGate;

impl IssuanceEligibilityGate {
    /// Precondition for enabling or disabling issuance: the credential must
    /// have a usable clone. A record with no clone, or only a failed clone
    /// attempt, is rejected.
    pub fn check_toggle(record: &CatalogueCredential) -> Result<()> {
        match IssuanceState::of(record) {
            IssuanceState::NotCloned => Err(CuratorError::NotCloned(record.id.clone())),
            IssuanceState::Cloned { .. } => Ok(()),
        }
    }

    /// Whether the record is currently exposed to the issuance catalog
    pub fn is_exposed(record: &CatalogueCredential) -> bool {
        matches!(
            IssuanceState::of(record),
            IssuanceState::Cloned { enabled: true }
        )
    }
}
