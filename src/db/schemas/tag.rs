use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::catalogue::tags::EcosystemTag;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

pub const TAG_COLLECTION: &str = "ecosystem_tags";

/// Stored ecosystem tag
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TagDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub tag: EcosystemTag,
}

impl TagDoc {
    pub fn new(tag: EcosystemTag) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            tag,
        }
    }
}

impl IntoIndexes for TagDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "metadata.is_deleted": false })
                    .name("tag_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for TagDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
