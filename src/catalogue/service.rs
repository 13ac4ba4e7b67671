//! Catalogue service
//!
//! Composition layer over the pipeline: builds records from parsed metadata,
//! drives registration and clone rounds, applies their outcomes to the store
//! and enforces the issuance gate. Routes call this; nothing here touches
//! hyper.
//!
//! Registration failures are not errors at this level. An import whose
//! registry round failed still persists, with the failure captured in the
//! record's logs, so the user can retry later without re-parsing. Only
//! parse/validation problems, duplicates and store failures surface as
//! errors.

use std::sync::Arc;
use tracing::info;

use crate::catalogue::builder::{CatalogueRecordBuilder, ImportInput};
use crate::catalogue::cloning::{CloneForIssuanceService, CloneOptions};
use crate::catalogue::issuance::IssuanceEligibilityGate;
use crate::catalogue::record::CatalogueCredential;
use crate::catalogue::registration::{
    RegistrationCoordinator, RegistrationOutcome, RegistrationPhase,
};
use crate::catalogue::store::{CatalogueStore, CredentialPatch, RoundLocks};
use crate::catalogue::tags::EcosystemTag;
use crate::clients::orbit::CredentialRegistry;
use crate::types::{CuratorError, Result};

use serde::Deserialize;

/// Classification fields a user can edit after import
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationUpdate {
    pub ecosystem_tag: Option<String>,
    pub issuer_name: Option<String>,
    pub issuer_did: Option<String>,
    pub issuer_entity_id: Option<String>,
}

pub struct CatalogueService {
    store: Arc<dyn CatalogueStore>,
    coordinator: Arc<RegistrationCoordinator>,
    cloner: CloneForIssuanceService,
    locks: RoundLocks,
}

impl CatalogueService {
    pub fn new(store: Arc<dyn CatalogueStore>, registry: Arc<dyn CredentialRegistry>) -> Self {
        let coordinator = Arc::new(RegistrationCoordinator::new(registry));
        Self {
            store,
            cloner: CloneForIssuanceService::new(coordinator.clone()),
            coordinator,
            locks: RoundLocks::new(),
        }
    }

    /// Seed the predefined ecosystem tags. Safe to call on every startup.
    pub async fn seed_predefined_tags(&self) -> Result<()> {
        self.store.seed_tags(EcosystemTag::predefined()).await
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Import a parsed schema/credential-definition pair into the catalogue,
    /// optionally registering it with the registry first. The record is
    /// persisted whatever the registration outcome was.
    pub async fn import(
        &self,
        input: ImportInput,
        register_with_orbit: bool,
    ) -> Result<CatalogueCredential> {
        // Reject duplicates before spending registry calls on them. The
        // store's uniqueness check still backstops a race.
        if let Some(existing) = self
            .store
            .find_by_source(
                &input.schema.ledger,
                &input.schema.schema_id,
                &input.cred_def.cred_def_id,
            )
            .await?
        {
            return Err(CuratorError::DuplicateImport(format!(
                "already imported as {}",
                existing.id
            )));
        }

        let mut record = CatalogueRecordBuilder::build(input)?;

        if register_with_orbit {
            let outcome = self.coordinator.register(&record).await;
            registration_patch(outcome).apply_to(&mut record);
        }

        let created = self.store.create(record).await?;
        info!(
            credential = %created.id,
            schema = %created.schema_id,
            phase = ?RegistrationPhase::of(&created),
            "credential imported"
        );

        Ok(created.normalized())
    }

    /// Re-run registration for an existing record. Resumes past a previously
    /// successful schema phase; a fully registered record is returned
    /// untouched.
    pub async fn retry_registration(&self, id: &str) -> Result<CatalogueCredential> {
        let lock = self.locks.for_credential(id);
        let _round = lock.lock().await;

        let record = self.require(id).await?;
        if record.is_fully_registered() {
            return Ok(record.normalized());
        }

        let outcome = self.coordinator.register(&record).await;
        let updated = self.store.update(id, registration_patch(outcome)).await?;
        info!(
            credential = %id,
            phase = ?RegistrationPhase::of(&updated),
            "registration retried"
        );

        Ok(updated.normalized())
    }

    // ========================================================================
    // Clones and issuance
    // ========================================================================

    /// Run a clone round and persist its result on the record. The failure
    /// channel is separate from the returned record: clone problems never
    /// touch the original registration fields.
    pub async fn clone_for_issuance(
        &self,
        id: &str,
        options: CloneOptions,
    ) -> Result<(CatalogueCredential, Option<CuratorError>)> {
        let lock = self.locks.for_credential(id);
        let _round = lock.lock().await;

        let record = self.require(id).await?;
        let round = self.cloner.run(&record, &options).await;

        // A new attempt replaces any previous clone group wholesale
        let updated = self
            .store
            .update(
                id,
                CredentialPatch {
                    clone_for_issuance: Some(round.clone),
                    ..Default::default()
                },
            )
            .await?;

        Ok((updated.normalized(), round.failure))
    }

    /// Drop the clone group. Leaves the original import untouched and never
    /// calls the registry to de-register. Idempotent.
    pub async fn delete_clone(&self, id: &str) -> Result<CatalogueCredential> {
        let lock = self.locks.for_credential(id);
        let _round = lock.lock().await;

        let updated = self
            .store
            .update(
                id,
                CredentialPatch {
                    clear_clone: true,
                    ..Default::default()
                },
            )
            .await?;
        Ok(updated.normalized())
    }

    /// Enable or disable issuance exposure. Requires a usable clone.
    pub async fn set_issuance(&self, id: &str, enabled: bool) -> Result<CatalogueCredential> {
        let record = self.require(id).await?;
        IssuanceEligibilityGate::check_toggle(&record)?;

        let updated = self
            .store
            .update(
                id,
                CredentialPatch {
                    enabled_for_issuance: Some(enabled),
                    ..Default::default()
                },
            )
            .await?;
        Ok(updated.normalized())
    }

    /// Records currently exposed to the downstream issuance catalog
    pub async fn list_issuable(&self) -> Result<Vec<CatalogueCredential>> {
        let mut records: Vec<CatalogueCredential> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(IssuanceEligibilityGate::is_exposed)
            .map(CatalogueCredential::normalized)
            .collect();
        records.sort_by(|a, b| b.imported_at.cmp(&a.imported_at));
        Ok(records)
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    pub async fn get_credential(&self, id: &str) -> Result<CatalogueCredential> {
        Ok(self.require(id).await?.normalized())
    }

    /// All records, newest import first
    pub async fn list_credentials(&self) -> Result<Vec<CatalogueCredential>> {
        let mut records: Vec<CatalogueCredential> = self
            .store
            .list()
            .await?
            .into_iter()
            .map(CatalogueCredential::normalized)
            .collect();
        records.sort_by(|a, b| b.imported_at.cmp(&a.imported_at));
        Ok(records)
    }

    pub async fn update_classification(
        &self,
        id: &str,
        update: ClassificationUpdate,
    ) -> Result<CatalogueCredential> {
        if let Some(tag) = &update.ecosystem_tag {
            if tag.trim().is_empty() {
                return Err(CuratorError::Validation(
                    "ecosystemTag must not be empty".to_string(),
                ));
            }
        }

        let updated = self
            .store
            .update(
                id,
                CredentialPatch {
                    ecosystem_tag: update.ecosystem_tag,
                    issuer_name: update.issuer_name,
                    issuer_did: update.issuer_did,
                    issuer_entity_id: update.issuer_entity_id,
                    ..Default::default()
                },
            )
            .await?;
        Ok(updated.normalized())
    }

    pub async fn delete_credential(&self, id: &str) -> Result<()> {
        self.store.delete(id).await
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub async fn list_tags(&self) -> Result<Vec<EcosystemTag>> {
        self.store.list_tags().await
    }

    pub async fn create_tag(&self, name: &str) -> Result<EcosystemTag> {
        if name.trim().is_empty() {
            return Err(CuratorError::Validation(
                "tag name must not be empty".to_string(),
            ));
        }
        self.store.create_tag(EcosystemTag::custom(name.trim())).await
    }

    pub async fn delete_tag(&self, id: &str) -> Result<()> {
        self.store.delete_tag(id).await
    }

    async fn require(&self, id: &str) -> Result<CatalogueCredential> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CuratorError::NotFound(format!("credential {}", id)))
    }
}

/// Translate a round outcome into the store patch that records it. The
/// schema fields are only written by a round that actually ran the schema
/// phase; a resumed round leaves the earlier log in place.
fn registration_patch(outcome: RegistrationOutcome) -> CredentialPatch {
    let mut patch = CredentialPatch::default();
    match outcome {
        RegistrationOutcome::FullyRegistered {
            schema,
            cred_def,
            schema_log,
            cred_def_log,
        } => {
            patch.orbit_schema_id = Some(schema.orbit_schema_id);
            patch.orbit_cred_def_id = Some(cred_def.orbit_cred_def_id);
            patch.orbit_schema_log = schema_log;
            patch.orbit_cred_def_log = Some(cred_def_log);
        }
        RegistrationOutcome::SchemaFailed { schema_log } => {
            patch.orbit_schema_log = Some(schema_log);
        }
        RegistrationOutcome::CredDefFailed {
            schema,
            schema_log,
            cred_def_log,
        } => {
            patch.orbit_schema_id = Some(schema.orbit_schema_id);
            patch.orbit_schema_log = schema_log;
            patch.orbit_cred_def_log = Some(cred_def_log);
        }
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::parser::{ParsedCredDef, ParsedSchema};
    use crate::catalogue::store::InMemoryCatalogueStore;
    use crate::clients::orbit::{
        CredDefRegistration, RegistryExchange, SchemaRegistration,
    };
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Mode {
        Ok,
        Fail(u16, &'static str),
    }

    struct TestRegistry {
        schema_mode: Mode,
        cred_def_mode: Mode,
        schema_calls: AtomicUsize,
        cred_def_calls: AtomicUsize,
        next_id: AtomicUsize,
    }

    impl TestRegistry {
        fn new(schema_mode: Mode, cred_def_mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                schema_mode,
                cred_def_mode,
                schema_calls: AtomicUsize::new(0),
                cred_def_calls: AtomicUsize::new(0),
                next_id: AtomicUsize::new(1),
            })
        }

        fn exchange(url: &str, mode: Mode, ok_body: serde_json::Value) -> RegistryExchange {
            match mode {
                Mode::Ok => RegistryExchange {
                    url: url.to_string(),
                    status_code: Some(200),
                    request_payload: json!({}),
                    response_body: Some(ok_body.to_string()),
                    error: None,
                },
                Mode::Fail(status, message) => RegistryExchange {
                    url: url.to_string(),
                    status_code: Some(status),
                    request_payload: json!({}),
                    response_body: Some(json!({ "message": message }).to_string()),
                    error: None,
                },
            }
        }
    }

    #[async_trait]
    impl CredentialRegistry for TestRegistry {
        async fn register_schema(&self, registration: &SchemaRegistration) -> RegistryExchange {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Self::exchange(
                "mock:/schemas",
                self.schema_mode,
                json!({
                    "schemaId": format!("ORB-S{}", n),
                    "schemaLedgerId": format!("L:2:{}:{}", registration.name, registration.version),
                    "ledger": registration.ledger,
                }),
            )
        }

        async fn register_cred_def(&self, registration: &CredDefRegistration) -> RegistryExchange {
            self.cred_def_calls.fetch_add(1, Ordering::SeqCst);
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            Self::exchange(
                "mock:/credential-definitions",
                self.cred_def_mode,
                json!({
                    "credentialDefinitionId": format!("ORB-CD{}", n),
                    "credentialDefinitionLedgerId":
                        format!("L:3:CL:{}:{}", registration.schema_id, registration.tag),
                }),
            )
        }
    }

    fn import_input() -> ImportInput {
        ImportInput {
            schema: ParsedSchema {
                schema_id: "S1".to_string(),
                name: "BC Person".to_string(),
                version: "1.0".to_string(),
                attributes: vec!["given_name".to_string(), "family_name".to_string()],
                ledger: "candy-test".to_string(),
                seq_no: 2170,
            },
            cred_def: ParsedCredDef {
                cred_def_id: "CD1".to_string(),
                schema_id: "S1".to_string(),
                tag: "default".to_string(),
                support_revocation: false,
                ledger: "candy-test".to_string(),
                seq_no: 2180,
            },
            ecosystem_tag: "bc-gov".to_string(),
            issuer_name: None,
            issuer_did: None,
            issuer_entity_id: None,
            schema_source_url: None,
            cred_def_source_url: None,
            imported_by: "admin".to_string(),
        }
    }

    fn service_with(registry: Arc<TestRegistry>) -> CatalogueService {
        CatalogueService::new(Arc::new(InMemoryCatalogueStore::new()), registry)
    }

    #[tokio::test]
    async fn import_without_registration_makes_no_registry_calls() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), false).await.unwrap();

        assert_eq!(registry.schema_calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.cred_def_calls.load(Ordering::SeqCst), 0);
        assert!(record.orbit_schema_id.is_none());
        assert_eq!(RegistrationPhase::of(&record), RegistrationPhase::Pending);
    }

    #[tokio::test]
    async fn import_with_registration_persists_both_ids() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();

        assert_eq!(record.orbit_schema_id.as_deref(), Some("ORB-S1"));
        assert!(record.orbit_cred_def_id.is_some());
        assert!(record.orbit_schema_log.unwrap().success);
        assert_eq!(
            RegistrationPhase::of(&service.get_credential(&record.id).await.unwrap()),
            RegistrationPhase::FullyRegistered
        );
    }

    #[tokio::test]
    async fn schema_failure_still_persists_the_record() {
        let registry = TestRegistry::new(Mode::Fail(400, "duplicate schema"), Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();

        let log = record.orbit_schema_log.as_ref().expect("schema log");
        assert!(!log.success);
        assert_eq!(log.status_code, Some(400));
        assert_eq!(log.error_message.as_deref(), Some("duplicate schema"));
        assert!(record.orbit_schema_id.is_none());
        assert!(record.orbit_cred_def_log.is_none());
        assert_eq!(registry.cred_def_calls.load(Ordering::SeqCst), 0);

        // Retrievable for a later retry
        let fetched = service.get_credential(&record.id).await.unwrap();
        assert_eq!(
            RegistrationPhase::of(&fetched),
            RegistrationPhase::SchemaFailed
        );
    }

    #[tokio::test]
    async fn cred_def_failure_keeps_schema_id_on_the_record() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Fail(500, "ledger write failed"));
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();

        assert_eq!(record.orbit_schema_id.as_deref(), Some("ORB-S1"));
        assert!(record.orbit_cred_def_id.is_none());
        assert!(!record.orbit_cred_def_log.as_ref().unwrap().success);

        let fetched = service.get_credential(&record.id).await.unwrap();
        assert_eq!(
            RegistrationPhase::of(&fetched),
            RegistrationPhase::CredDefFailed
        );
    }

    #[tokio::test]
    async fn retry_resumes_without_recalling_schema_endpoint() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Fail(500, "ledger write failed"));
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();
        assert_eq!(registry.schema_calls.load(Ordering::SeqCst), 1);

        // The registry recovers; flip the scripted mode by swapping services
        // is not possible on a shared Arc, so rebuild with a healthy one and
        // the same store contents instead.
        let healthy = TestRegistry::new(Mode::Ok, Mode::Ok);
        let store = Arc::new(InMemoryCatalogueStore::new());
        store.create(record.clone()).await.unwrap();
        let service = CatalogueService::new(store, healthy.clone());

        let updated = service.retry_registration(&record.id).await.unwrap();

        assert_eq!(healthy.schema_calls.load(Ordering::SeqCst), 0);
        assert_eq!(healthy.cred_def_calls.load(Ordering::SeqCst), 1);
        assert_eq!(updated.orbit_schema_id.as_deref(), Some("ORB-S1"));
        assert!(updated.is_fully_registered());
    }

    #[tokio::test]
    async fn retry_on_fully_registered_record_is_a_no_op() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();
        let before_schema = registry.schema_calls.load(Ordering::SeqCst);
        let before_cred_def = registry.cred_def_calls.load(Ordering::SeqCst);

        service.retry_registration(&record.id).await.unwrap();

        assert_eq!(registry.schema_calls.load(Ordering::SeqCst), before_schema);
        assert_eq!(
            registry.cred_def_calls.load(Ordering::SeqCst),
            before_cred_def
        );
    }

    #[tokio::test]
    async fn duplicate_import_is_rejected_before_any_registry_call() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        service.import(import_input(), false).await.unwrap();
        let calls_before = registry.schema_calls.load(Ordering::SeqCst);

        let err = service.import(import_input(), true).await.unwrap_err();
        assert!(matches!(err, CuratorError::DuplicateImport(_)));
        assert_eq!(registry.schema_calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn clone_fills_group_and_leaves_original_untouched() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();
        let original_schema_id = record.orbit_schema_id.clone();

        let (updated, failure) = service
            .clone_for_issuance(&record.id, CloneOptions::default())
            .await
            .unwrap();

        assert!(failure.is_none());
        assert!(updated.is_cloned());
        assert_eq!(updated.orbit_schema_id, original_schema_id);
        let clone = updated.clone_for_issuance.unwrap();
        assert!(clone.cloned_orbit_schema_id.is_some());
        assert!(!clone.enabled_for_issuance);
    }

    #[tokio::test]
    async fn clone_failure_is_isolated_from_the_original() {
        let failing = TestRegistry::new(Mode::Fail(500, "registry down"), Mode::Ok);
        let store = Arc::new(InMemoryCatalogueStore::new());

        // Import succeeded in the past; the registry is failing now
        let healthy = TestRegistry::new(Mode::Ok, Mode::Ok);
        let import_service = CatalogueService::new(store.clone(), healthy);
        let record = import_service.import(import_input(), true).await.unwrap();

        let service = CatalogueService::new(store, failing);
        let (updated, failure) = service
            .clone_for_issuance(&record.id, CloneOptions::default())
            .await
            .unwrap();

        assert!(matches!(failure, Some(CuratorError::Registration(_))));
        // Original registration state untouched
        assert_eq!(updated.orbit_schema_id, record.orbit_schema_id);
        assert!(updated.orbit_schema_log.as_ref().unwrap().success);
        // The failed attempt is recorded with its log
        let clone = updated.clone_for_issuance.unwrap();
        assert!(!clone.cloned_orbit_schema_log.as_ref().unwrap().success);
        assert!(!clone.is_usable());
    }

    #[tokio::test]
    async fn delete_clone_then_reclone_gets_fresh_identifiers() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();
        let (first, _) = service
            .clone_for_issuance(&record.id, CloneOptions::default())
            .await
            .unwrap();
        let first_ids = first.clone_for_issuance.unwrap().cloned_orbit_schema_id;

        let cleared = service.delete_clone(&record.id).await.unwrap();
        assert!(cleared.clone_for_issuance.is_none());
        // The original import fields survive the clone deletion
        assert_eq!(cleared.orbit_schema_id, record.orbit_schema_id);

        let (second, _) = service
            .clone_for_issuance(&record.id, CloneOptions::default())
            .await
            .unwrap();
        let second_ids = second.clone_for_issuance.unwrap().cloned_orbit_schema_id;
        assert_ne!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn issuance_toggle_requires_a_clone() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();

        let err = service.set_issuance(&record.id, true).await.unwrap_err();
        assert!(matches!(err, CuratorError::NotCloned(_)));

        service
            .clone_for_issuance(&record.id, CloneOptions::default())
            .await
            .unwrap();
        let enabled = service.set_issuance(&record.id, true).await.unwrap();
        assert!(enabled.issuance_enabled());

        let issuable = service.list_issuable().await.unwrap();
        assert_eq!(issuable.len(), 1);

        let disabled = service.set_issuance(&record.id, false).await.unwrap();
        assert!(!disabled.issuance_enabled());
        assert!(service.list_issuable().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn classification_update_leaves_registration_alone() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry.clone());

        let record = service.import(import_input(), true).await.unwrap();
        let updated = service
            .update_classification(
                &record.id,
                ClassificationUpdate {
                    ecosystem_tag: Some("health".to_string()),
                    issuer_name: Some("Interior Health".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.ecosystem_tag, "health");
        assert_eq!(updated.orbit_schema_id, record.orbit_schema_id);

        let err = service
            .update_classification(
                &record.id,
                ClassificationUpdate {
                    ecosystem_tag: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CuratorError::Validation(_)));
    }

    #[tokio::test]
    async fn legacy_error_shape_is_migrated_on_read_not_in_store() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let store = Arc::new(InMemoryCatalogueStore::new());
        let service = CatalogueService::new(store.clone(), registry);

        let mut legacy = {
            let input = import_input();
            CatalogueRecordBuilder::build(input).unwrap()
        };
        legacy.orbit_registration_error = Some("orbit rejected schema".to_string());
        let id = legacy.id.clone();
        store.create(legacy).await.unwrap();

        let read = service.get_credential(&id).await.unwrap();
        let log = read.orbit_schema_log.expect("migrated log");
        assert_eq!(log.error_message.as_deref(), Some("orbit rejected schema"));
        assert!(read.orbit_registration_error.is_none());

        // The stored document keeps its legacy shape
        let raw = store.get(&id).await.unwrap().unwrap();
        assert!(raw.orbit_registration_error.is_some());
        assert!(raw.orbit_schema_log.is_none());
    }

    #[tokio::test]
    async fn listing_returns_newest_imports_first() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let store = Arc::new(InMemoryCatalogueStore::new());
        let service = CatalogueService::new(store.clone(), registry);

        let mut older = CatalogueRecordBuilder::build(import_input()).unwrap();
        older.imported_at = Utc::now() - Duration::hours(2);
        let older_id = older.id.clone();
        store.create(older).await.unwrap();

        let mut newer_input = import_input();
        newer_input.cred_def.cred_def_id = "CD2".to_string();
        let newer = CatalogueRecordBuilder::build(newer_input).unwrap();
        let newer_id = newer.id.clone();
        store.create(newer).await.unwrap();

        let listed = service.list_credentials().await.unwrap();
        assert_eq!(listed[0].id, newer_id);
        assert_eq!(listed[1].id, older_id);
    }

    #[tokio::test]
    async fn tag_management_round_trip() {
        let registry = TestRegistry::new(Mode::Ok, Mode::Ok);
        let service = service_with(registry);

        service.seed_predefined_tags().await.unwrap();
        let seeded = service.list_tags().await.unwrap();
        assert!(seeded.iter().any(|t| t.id == "bc-gov"));

        let custom = service.create_tag("Agriculture").await.unwrap();
        assert!(!custom.predefined);
        service.delete_tag(&custom.id).await.unwrap();

        let err = service.create_tag("  ").await.unwrap_err();
        assert!(matches!(err, CuratorError::Validation(_)));

        let err = service.delete_tag("bc-gov").await.unwrap_err();
        assert!(matches!(err, CuratorError::TagProtected(_)));
    }
}
