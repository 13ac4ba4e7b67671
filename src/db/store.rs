//! MongoDB-backed catalogue store
//!
//! Translates `CredentialPatch` into `$set`/`$unset` documents. The
//! translation must mirror `CredentialPatch::apply_to` exactly; the
//! in-memory store tests are the reference for both.

use async_trait::async_trait;
use bson::{doc, Bson, DateTime, Document};
use tracing::warn;

use crate::catalogue::record::CatalogueCredential;
use crate::catalogue::store::{CatalogueStore, CredentialPatch};
use crate::catalogue::tags::EcosystemTag;
use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{CredentialDoc, TagDoc, CREDENTIAL_COLLECTION, TAG_COLLECTION};
use crate::types::{CuratorError, Result};

/// Wire names of every clone-group field. Writing a new group unsets the
/// members the group leaves absent, so a failed round never inherits ids
/// from an earlier clone.
const CLONE_FIELDS: &[&str] = &[
    "clonedAt",
    "clonedSchemaName",
    "clonedSchemaVersion",
    "clonedCredDefTag",
    "clonedLedger",
    "clonedSchemaId",
    "clonedCredDefId",
    "clonedOrbitSchemaId",
    "clonedOrbitCredDefId",
    "clonedOrbitSchemaLog",
    "clonedOrbitCredDefLog",
    "enabledForIssuance",
];

pub struct MongoCatalogueStore {
    credentials: MongoCollection<CredentialDoc>,
    tags: MongoCollection<TagDoc>,
}

impl MongoCatalogueStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            credentials: client.collection(CREDENTIAL_COLLECTION).await?,
            tags: client.collection(TAG_COLLECTION).await?,
        })
    }
}

fn to_bson_value<T: serde::Serialize>(value: &T) -> Result<Bson> {
    bson::to_bson(value)
        .map_err(|e| CuratorError::Internal(format!("BSON serialization failed: {}", e)))
}

/// Build the update document for a patch
fn patch_update(patch: &CredentialPatch) -> Result<Document> {
    let mut set = doc! { "metadata.updated_at": DateTime::now() };
    let mut unset = Document::new();

    if let Some(tag) = &patch.ecosystem_tag {
        set.insert("ecosystemTag", tag);
    }
    if let Some(name) = &patch.issuer_name {
        set.insert("issuerName", name);
    }
    if let Some(did) = &patch.issuer_did {
        set.insert("issuerDid", did);
    }
    if let Some(entity) = &patch.issuer_entity_id {
        set.insert("issuerEntityId", entity);
    }

    if let Some(id) = &patch.orbit_schema_id {
        set.insert("orbitSchemaId", id);
    }
    if let Some(id) = &patch.orbit_cred_def_id {
        set.insert("orbitCredDefId", id);
    }
    if let Some(log) = &patch.orbit_schema_log {
        set.insert("orbitSchemaLog", to_bson_value(log)?);
    }
    if let Some(log) = &patch.orbit_cred_def_log {
        set.insert("orbitCredDefLog", to_bson_value(log)?);
    }

    if patch.clear_clone {
        for field in CLONE_FIELDS {
            unset.insert(*field, "");
        }
    }
    if let Some(clone) = &patch.clone_for_issuance {
        let Bson::Document(group) = to_bson_value(clone)? else {
            return Err(CuratorError::Internal(
                "clone group did not serialize to a document".into(),
            ));
        };
        for field in CLONE_FIELDS {
            match group.get(*field) {
                Some(value) => {
                    unset.remove(*field);
                    set.insert(*field, value.clone());
                }
                None => {
                    unset.insert(*field, "");
                }
            }
        }
    }
    if let Some(enabled) = patch.enabled_for_issuance {
        unset.remove("enabledForIssuance");
        set.insert("enabledForIssuance", enabled);
    }

    let mut update = doc! { "$set": set };
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    Ok(update)
}

#[async_trait]
impl CatalogueStore for MongoCatalogueStore {
    async fn create(&self, credential: CatalogueCredential) -> Result<CatalogueCredential> {
        let doc = CredentialDoc::new(credential.clone());
        match self.credentials.insert_one(doc).await {
            Ok(_) => Ok(credential),
            Err(CuratorError::Database(msg)) if msg.contains("E11000") => {
                Err(CuratorError::DuplicateImport(format!(
                    "{} / {} on {}",
                    credential.schema_id, credential.cred_def_id, credential.ledger
                )))
            }
            Err(e) => Err(e),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogueCredential>> {
        let doc = self.credentials.find_one(doc! { "id": id }).await?;
        Ok(doc.map(|d| d.credential))
    }

    async fn list(&self) -> Result<Vec<CatalogueCredential>> {
        let docs = self.credentials.find_many(doc! {}).await?;
        Ok(docs.into_iter().map(|d| d.credential).collect())
    }

    async fn update(&self, id: &str, patch: CredentialPatch) -> Result<CatalogueCredential> {
        let update = patch_update(&patch)?;

        // A bare issuance toggle only applies while a clone group exists,
        // matching the in-memory merge. The filter keeps a stray
        // enabledForIssuance from appearing on an uncloned record.
        let toggle_only =
            patch.enabled_for_issuance.is_some() && patch.clone_for_issuance.is_none();
        let mut filter = doc! { "id": id };
        if toggle_only {
            filter.insert("clonedAt", doc! { "$exists": true });
        }

        match self.credentials.find_one_and_update(filter, update).await? {
            Some(doc) => Ok(doc.credential),
            None if toggle_only => {
                match self.credentials.find_one(doc! { "id": id }).await? {
                    Some(doc) => {
                        warn!(credential_id = %id, "Issuance toggle on a record with no clone group; leaving it unchanged");
                        Ok(doc.credential)
                    }
                    None => Err(CuratorError::NotFound(format!("credential {}", id))),
                }
            }
            None => Err(CuratorError::NotFound(format!("credential {}", id))),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = self.credentials.soft_delete(doc! { "id": id }).await?;
        if result.matched_count == 0 {
            return Err(CuratorError::NotFound(format!("credential {}", id)));
        }
        Ok(())
    }

    async fn find_by_source(
        &self,
        ledger: &str,
        schema_id: &str,
        cred_def_id: &str,
    ) -> Result<Option<CatalogueCredential>> {
        let doc = self
            .credentials
            .find_one(doc! {
                "ledger": ledger,
                "schemaId": schema_id,
                "credDefId": cred_def_id,
            })
            .await?;
        Ok(doc.map(|d| d.credential))
    }

    async fn list_tags(&self) -> Result<Vec<EcosystemTag>> {
        let docs = self.tags.find_many(doc! {}).await?;
        let mut tags: Vec<EcosystemTag> = docs.into_iter().map(|d| d.tag).collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create_tag(&self, tag: EcosystemTag) -> Result<EcosystemTag> {
        self.tags.insert_one(TagDoc::new(tag.clone())).await?;
        Ok(tag)
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        let existing = self.tags.find_one(doc! { "id": id }).await?;
        let Some(doc) = existing else {
            return Err(CuratorError::NotFound(format!("tag {}", id)));
        };
        if doc.tag.predefined {
            return Err(CuratorError::TagProtected(id.to_string()));
        }
        self.tags.soft_delete(doc! { "id": id }).await?;
        Ok(())
    }

    async fn seed_tags(&self, tags: Vec<EcosystemTag>) -> Result<()> {
        for tag in tags {
            let present = self.tags.find_one(doc! { "id": &tag.id }).await?;
            if present.is_none() {
                self.tags.insert_one(TagDoc::new(tag)).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::record::{CloneForIssuance, OperationLog};
    use chrono::Utc;

    fn ok_log() -> OperationLog {
        OperationLog {
            success: true,
            status_code: Some(200),
            request_url: Some("https://registry.example/schemas".to_string()),
            request_payload: None,
            response_body: None,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    fn full_clone_group() -> CloneForIssuance {
        CloneForIssuance {
            cloned_at: Utc::now(),
            cloned_schema_name: "BC Person".to_string(),
            cloned_schema_version: "1.0.250102030405".to_string(),
            cloned_cred_def_tag: "default".to_string(),
            cloned_ledger: Some("candy-test".to_string()),
            cloned_schema_id: Some("S-CLONE".to_string()),
            cloned_cred_def_id: Some("CD-CLONE".to_string()),
            cloned_orbit_schema_id: Some("ORB-S2".to_string()),
            cloned_orbit_cred_def_id: Some("ORB-CD2".to_string()),
            cloned_orbit_schema_log: Some(ok_log()),
            cloned_orbit_cred_def_log: Some(ok_log()),
            enabled_for_issuance: false,
        }
    }

    fn failed_clone_group() -> CloneForIssuance {
        CloneForIssuance {
            cloned_at: Utc::now(),
            cloned_schema_name: "BC Person".to_string(),
            cloned_schema_version: "1.0.250102030405".to_string(),
            cloned_cred_def_tag: "default".to_string(),
            cloned_ledger: None,
            cloned_schema_id: None,
            cloned_cred_def_id: None,
            cloned_orbit_schema_id: None,
            cloned_orbit_cred_def_id: None,
            cloned_orbit_schema_log: Some(ok_log()),
            cloned_orbit_cred_def_log: None,
            enabled_for_issuance: false,
        }
    }

    #[test]
    fn classification_patch_sets_only_named_fields() {
        let patch = CredentialPatch {
            ecosystem_tag: Some("health".to_string()),
            issuer_name: Some("Ministry of Health".to_string()),
            ..Default::default()
        };

        let update = patch_update(&patch).unwrap();
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("ecosystemTag").unwrap(), "health");
        assert_eq!(set.get_str("issuerName").unwrap(), "Ministry of Health");
        assert!(!set.contains_key("orbitSchemaId"));
        assert!(!set.contains_key("clonedAt"));
        assert!(!update.contains_key("$unset"));
    }

    #[test]
    fn full_clone_group_sets_every_field() {
        let patch = CredentialPatch {
            clone_for_issuance: Some(full_clone_group()),
            ..Default::default()
        };

        let update = patch_update(&patch).unwrap();
        let set = update.get_document("$set").unwrap();

        for field in CLONE_FIELDS {
            assert!(set.contains_key(*field), "missing {}", field);
        }
        assert!(!update.contains_key("$unset"));
    }

    #[test]
    fn partial_clone_group_unsets_absent_members() {
        let patch = CredentialPatch {
            clone_for_issuance: Some(failed_clone_group()),
            ..Default::default()
        };

        let update = patch_update(&patch).unwrap();
        let set = update.get_document("$set").unwrap();
        let unset = update.get_document("$unset").unwrap();

        assert!(set.contains_key("clonedAt"));
        assert!(set.contains_key("clonedOrbitSchemaLog"));
        assert!(set.contains_key("enabledForIssuance"));
        assert!(unset.contains_key("clonedOrbitSchemaId"));
        assert!(unset.contains_key("clonedOrbitCredDefId"));
        assert!(unset.contains_key("clonedOrbitCredDefLog"));
        // No field may appear on both sides of the update
        for (key, _) in set.iter() {
            assert!(!unset.contains_key(key), "{} set and unset", key);
        }
    }

    #[test]
    fn clear_clone_unsets_the_whole_group() {
        let patch = CredentialPatch {
            clear_clone: true,
            ..Default::default()
        };

        let update = patch_update(&patch).unwrap();
        let unset = update.get_document("$unset").unwrap();

        for field in CLONE_FIELDS {
            assert!(unset.contains_key(*field), "missing {}", field);
        }
    }

    #[test]
    fn issuance_toggle_sets_the_flag() {
        let patch = CredentialPatch {
            enabled_for_issuance: Some(true),
            ..Default::default()
        };

        let update = patch_update(&patch).unwrap();
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_bool("enabledForIssuance").unwrap(), true);
    }

    #[test]
    fn registration_patch_writes_ids_and_logs() {
        let patch = CredentialPatch {
            orbit_schema_id: Some("ORB-S1".to_string()),
            orbit_cred_def_id: Some("ORB-CD1".to_string()),
            orbit_schema_log: Some(ok_log()),
            orbit_cred_def_log: Some(ok_log()),
            ..Default::default()
        };

        let update = patch_update(&patch).unwrap();
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("orbitSchemaId").unwrap(), "ORB-S1");
        assert_eq!(set.get_str("orbitCredDefId").unwrap(), "ORB-CD1");
        assert!(set.get_document("orbitSchemaLog").is_ok());
        assert!(set.get_document("orbitCredDefLog").is_ok());
    }
}
