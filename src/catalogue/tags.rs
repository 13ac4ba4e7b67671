//! Ecosystem tags
//!
//! Classification labels for catalogued credentials. A fixed predefined set
//! is seeded at startup; users can add custom tags on top. Predefined tags
//! cannot be deleted, and deleting a custom tag never cascades to the
//! credentials referencing it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Predefined tags seeded at startup. The ids double as stable slugs so
/// records can reference them without a lookup.
pub const PREDEFINED_TAGS: &[(&str, &str)] = &[
    ("bc-gov", "BC Government"),
    ("health", "Health"),
    ("education", "Education"),
    ("finance", "Finance"),
    ("natural-resources", "Natural Resources"),
    ("other", "Other"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemTag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub predefined: bool,
}

impl EcosystemTag {
    /// The seeded tag set
    pub fn predefined() -> Vec<EcosystemTag> {
        PREDEFINED_TAGS
            .iter()
            .map(|(id, name)| EcosystemTag {
                id: (*id).to_string(),
                name: (*name).to_string(),
                predefined: true,
            })
            .collect()
    }

    /// A user-created tag with a fresh id
    pub fn custom(name: &str) -> EcosystemTag {
        EcosystemTag {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            predefined: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn predefined_ids_are_unique() {
        let tags = EcosystemTag::predefined();
        let ids: HashSet<_> = tags.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), tags.len());
        assert!(tags.iter().all(|t| t.predefined));
    }

    #[test]
    fn custom_tags_get_fresh_ids() {
        let a = EcosystemTag::custom("Agriculture");
        let b = EcosystemTag::custom("Agriculture");
        assert_ne!(a.id, b.id);
        assert!(!a.predefined);
    }
}
