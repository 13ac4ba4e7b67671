use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::catalogue::record::CatalogueCredential;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

pub const CREDENTIAL_COLLECTION: &str = "catalogue_credentials";

/// Stored catalogue credential
///
/// The credential payload is flattened into the document root so the stored
/// shape matches the API shape field for field, with `_id` and `metadata`
/// alongside.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CredentialDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub credential: CatalogueCredential,
}

impl CredentialDoc {
    pub fn new(credential: CatalogueCredential) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            credential,
        }
    }
}

impl IntoIndexes for CredentialDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One live document per ledger artifact pair. Scoped to live
            // documents so a soft-deleted credential can be re-imported.
            (
                doc! { "ledger": 1, "schemaId": 1, "credDefId": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "metadata.is_deleted": false })
                        .name("catalogue_source_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("catalogue_id_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for CredentialDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
