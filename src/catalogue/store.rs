//! Catalogue persistence
//!
//! `CatalogueStore` is the persistence seam: MongoDB in production, a
//! DashMap-backed store in dev mode and tests. Updates go through
//! `CredentialPatch`, a partial merge where absent fields are untouched.
//! Every pipeline component writes a disjoint subset of fields through it,
//! which is what keeps a registration retry from clobbering classification
//! edits and a clone round from touching the original registration state.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::catalogue::record::{CatalogueCredential, CloneForIssuance, OperationLog};
use crate::catalogue::tags::EcosystemTag;
use crate::types::{CuratorError, Result};

// ============================================================================
// Partial update
// ============================================================================

/// Partial update of a credential record. `None` fields are untouched. The
/// clone group is written or cleared as a unit; `clear_clone` and a new group
/// never travel together.
#[derive(Debug, Clone, Default)]
pub struct CredentialPatch {
    // Classification
    pub ecosystem_tag: Option<String>,
    pub issuer_name: Option<String>,
    pub issuer_did: Option<String>,
    pub issuer_entity_id: Option<String>,

    // Registration state (original pair)
    pub orbit_schema_id: Option<String>,
    pub orbit_cred_def_id: Option<String>,
    pub orbit_schema_log: Option<OperationLog>,
    pub orbit_cred_def_log: Option<OperationLog>,

    // Clone group
    pub clone_for_issuance: Option<CloneForIssuance>,
    pub clear_clone: bool,

    // Issuance toggle (only meaningful while a clone group exists)
    pub enabled_for_issuance: Option<bool>,
}

impl CredentialPatch {
    /// Merge into a record. Mongo translates the same semantics into
    /// `$set`/`$unset`; the two must stay in lockstep.
    pub fn apply_to(&self, record: &mut CatalogueCredential) {
        if let Some(tag) = &self.ecosystem_tag {
            record.ecosystem_tag = tag.clone();
        }
        if let Some(name) = &self.issuer_name {
            record.issuer_name = Some(name.clone());
        }
        if let Some(did) = &self.issuer_did {
            record.issuer_did = Some(did.clone());
        }
        if let Some(entity) = &self.issuer_entity_id {
            record.issuer_entity_id = Some(entity.clone());
        }

        if let Some(id) = &self.orbit_schema_id {
            record.orbit_schema_id = Some(id.clone());
        }
        if let Some(id) = &self.orbit_cred_def_id {
            record.orbit_cred_def_id = Some(id.clone());
        }
        if let Some(log) = &self.orbit_schema_log {
            record.orbit_schema_log = Some(log.clone());
        }
        if let Some(log) = &self.orbit_cred_def_log {
            record.orbit_cred_def_log = Some(log.clone());
        }

        if self.clear_clone {
            record.clone_for_issuance = None;
        }
        if let Some(clone) = &self.clone_for_issuance {
            record.clone_for_issuance = Some(clone.clone());
        }
        if let Some(enabled) = self.enabled_for_issuance {
            if let Some(clone) = &mut record.clone_for_issuance {
                clone.enabled_for_issuance = enabled;
            }
        }
    }
}

// ============================================================================
// Store trait
// ============================================================================

#[async_trait]
pub trait CatalogueStore: Send + Sync {
    /// Insert a new record. Rejects a second record for the same
    /// `(ledger, schemaId, credDefId)` with `DuplicateImport`.
    async fn create(&self, credential: CatalogueCredential) -> Result<CatalogueCredential>;
    async fn get(&self, id: &str) -> Result<Option<CatalogueCredential>>;
    async fn list(&self) -> Result<Vec<CatalogueCredential>>;
    /// Apply a partial update and return the updated record
    async fn update(&self, id: &str, patch: CredentialPatch) -> Result<CatalogueCredential>;
    async fn delete(&self, id: &str) -> Result<()>;
    /// Duplicate detection lookup
    async fn find_by_source(
        &self,
        ledger: &str,
        schema_id: &str,
        cred_def_id: &str,
    ) -> Result<Option<CatalogueCredential>>;

    async fn list_tags(&self) -> Result<Vec<EcosystemTag>>;
    async fn create_tag(&self, tag: EcosystemTag) -> Result<EcosystemTag>;
    /// Delete a custom tag. Predefined tags are protected; referencing
    /// credentials are left alone either way.
    async fn delete_tag(&self, id: &str) -> Result<()>;
    /// Insert any of the given tags that are not present yet
    async fn seed_tags(&self, tags: Vec<EcosystemTag>) -> Result<()>;
}

// ============================================================================
// Round locks
// ============================================================================

/// Per-credential async locks. A registration retry and a clone round on the
/// same record must not interleave their read-call-write sequences; rounds on
/// different records run freely in parallel.
#[derive(Default)]
pub struct RoundLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RoundLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// The lock for one credential id, created on first use
    pub fn for_credential(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// ============================================================================
// In-memory implementation (dev mode and tests)
// ============================================================================

pub struct InMemoryCatalogueStore {
    credentials: DashMap<String, CatalogueCredential>,
    tags: DashMap<String, EcosystemTag>,
}

impl InMemoryCatalogueStore {
    pub fn new() -> Self {
        Self {
            credentials: DashMap::new(),
            tags: DashMap::new(),
        }
    }
}

impl Default for InMemoryCatalogueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogueStore for InMemoryCatalogueStore {
    async fn create(&self, credential: CatalogueCredential) -> Result<CatalogueCredential> {
        let duplicate = self.credentials.iter().any(|entry| {
            entry.ledger == credential.ledger
                && entry.schema_id == credential.schema_id
                && entry.cred_def_id == credential.cred_def_id
        });
        if duplicate {
            return Err(CuratorError::DuplicateImport(format!(
                "{} / {} on {}",
                credential.schema_id, credential.cred_def_id, credential.ledger
            )));
        }

        self.credentials
            .insert(credential.id.clone(), credential.clone());
        Ok(credential)
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogueCredential>> {
        Ok(self.credentials.get(id).map(|entry| entry.clone()))
    }

    async fn list(&self) -> Result<Vec<CatalogueCredential>> {
        Ok(self
            .credentials
            .iter()
            .map(|entry| entry.clone())
            .collect())
    }

    async fn update(&self, id: &str, patch: CredentialPatch) -> Result<CatalogueCredential> {
        let mut entry = self
            .credentials
            .get_mut(id)
            .ok_or_else(|| CuratorError::NotFound(format!("credential {}", id)))?;
        patch.apply_to(entry.value_mut());
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.credentials
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CuratorError::NotFound(format!("credential {}", id)))
    }

    async fn find_by_source(
        &self,
        ledger: &str,
        schema_id: &str,
        cred_def_id: &str,
    ) -> Result<Option<CatalogueCredential>> {
        Ok(self
            .credentials
            .iter()
            .find(|entry| {
                entry.ledger == ledger
                    && entry.schema_id == schema_id
                    && entry.cred_def_id == cred_def_id
            })
            .map(|entry| entry.clone()))
    }

    async fn list_tags(&self) -> Result<Vec<EcosystemTag>> {
        let mut tags: Vec<EcosystemTag> = self.tags.iter().map(|entry| entry.clone()).collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_tag(&self, tag: EcosystemTag) -> Result<EcosystemTag> {
        self.tags.insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        let protected = self
            .tags
            .get(id)
            .map(|entry| entry.predefined)
            .unwrap_or(false);
        if protected {
            return Err(CuratorError::TagProtected(id.to_string()));
        }
        self.tags
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CuratorError::NotFound(format!("tag {}", id)))
    }

    async fn seed_tags(&self, tags: Vec<EcosystemTag>) -> Result<()> {
        for tag in tags {
            self.tags.entry(tag.id.clone()).or_insert(tag);
        }
        Ok(())
    }
}
