//! Catalogue record builder
//!
//! Merges parsed ledger metadata with user-supplied classification into a
//! canonical `CatalogueCredential`. Pure assembly: no registry calls, no
//! persistence. Registration and storage are composed by the service layer.

use chrono::Utc;
use uuid::Uuid;

use crate::catalogue::parser::{ParsedCredDef, ParsedSchema};
use crate::catalogue::record::CatalogueCredential;
use crate::types::{CuratorError, Result};

/// Everything an import submission carries into record assembly
#[derive(Debug, Clone)]
pub struct ImportInput {
    pub schema: ParsedSchema,
    pub cred_def: ParsedCredDef,
    pub ecosystem_tag: String,
    pub issuer_name: Option<String>,
    pub issuer_did: Option<String>,
    pub issuer_entity_id: Option<String>,
    pub schema_source_url: Option<String>,
    pub cred_def_source_url: Option<String>,
    pub imported_by: String,
}

pub struct CatalogueRecordBuilder;

impl CatalogueRecordBuilder {
    /// Assemble a new record. The ecosystem tag is the one mandatory
    /// classification field and is enforced here, before any registry call
    /// can be attempted. Parsed fields are copied verbatim; attribute order
    /// is preserved.
    pub fn build(input: ImportInput) -> Result<CatalogueCredential> {
        if input.ecosystem_tag.trim().is_empty() {
            return Err(CuratorError::Validation(
                "ecosystemTag is required".to_string(),
            ));
        }

        // The parser already enforces both of these; reject here too so a
        // hand-assembled submission cannot bypass them.
        if input.schema.schema_id != input.cred_def.schema_id {
            return Err(CuratorError::SchemaMismatch {
                expected: input.schema.schema_id,
                found: input.cred_def.schema_id,
            });
        }
        if input.schema.ledger != input.cred_def.ledger {
            return Err(CuratorError::Validation(format!(
                "schema is on ledger {} but credential definition is on {}",
                input.schema.ledger, input.cred_def.ledger
            )));
        }

        Ok(CatalogueCredential {
            id: Uuid::new_v4().to_string(),
            schema_id: input.schema.schema_id,
            schema_name: input.schema.name,
            schema_version: input.schema.version,
            attributes: input.schema.attributes,
            cred_def_id: input.cred_def.cred_def_id,
            cred_def_tag: input.cred_def.tag,
            support_revocation: input.cred_def.support_revocation,
            ledger: input.schema.ledger,
            ecosystem_tag: input.ecosystem_tag,
            issuer_name: input.issuer_name,
            issuer_did: input.issuer_did,
            issuer_entity_id: input.issuer_entity_id,
            schema_source_url: input.schema_source_url,
            cred_def_source_url: input.cred_def_source_url,
            imported_at: Utc::now(),
            imported_by: input.imported_by,
            orbit_schema_id: None,
            orbit_cred_def_id: None,
            orbit_schema_log: None,
            orbit_cred_def_log: None,
            clone_for_issuance: None,
            orbit_registration_error: None,
            orbit_registration_error_details: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed_schema() -> ParsedSchema {
        ParsedSchema {
            schema_id: "S1".to_string(),
            name: "BC Person".to_string(),
            version: "1.0".to_string(),
            attributes: vec!["given_name".to_string(), "family_name".to_string()],
            ledger: "candy-test".to_string(),
            seq_no: 2170,
        }
    }

    fn parsed_cred_def() -> ParsedCredDef {
        ParsedCredDef {
            cred_def_id: "CD1".to_string(),
            schema_id: "S1".to_string(),
            tag: "default".to_string(),
            support_revocation: false,
            ledger: "candy-test".to_string(),
            seq_no: 2180,
        }
    }

    fn input() -> ImportInput {
        ImportInput {
            schema: parsed_schema(),
            cred_def: parsed_cred_def(),
            ecosystem_tag: "bc-gov".to_string(),
            issuer_name: Some("Service BC".to_string()),
            issuer_did: None,
            issuer_entity_id: None,
            schema_source_url: Some("https://candyscan.idlab.org/tx/CANDY_TEST/domain/2170".to_string()),
            cred_def_source_url: Some("https://candyscan.idlab.org/tx/CANDY_TEST/domain/2180".to_string()),
            imported_by: "admin".to_string(),
        }
    }

    #[test]
    fn builds_record_with_exact_parsed_fields() {
        let record = CatalogueRecordBuilder::build(input()).unwrap();

        assert_eq!(record.schema_id, "S1");
        assert_eq!(record.schema_name, "BC Person");
        assert_eq!(record.schema_version, "1.0");
        assert_eq!(record.attributes, vec!["given_name", "family_name"]);
        assert_eq!(record.cred_def_id, "CD1");
        assert_eq!(record.ledger, "candy-test");
        assert_eq!(record.ecosystem_tag, "bc-gov");
        assert!(!record.id.is_empty());
        assert!(record.orbit_schema_id.is_none());
        assert!(record.clone_for_issuance.is_none());
    }

    #[test]
    fn each_record_gets_a_fresh_id() {
        let a = CatalogueRecordBuilder::build(input()).unwrap();
        let b = CatalogueRecordBuilder::build(input()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn requires_an_ecosystem_tag() {
        let mut missing = input();
        missing.ecosystem_tag = "  ".to_string();

        let err = CatalogueRecordBuilder::build(missing).unwrap_err();
        assert!(matches!(err, CuratorError::Validation(_)));
    }

    #[test]
    fn rejects_mismatched_pair() {
        let mut mismatched = input();
        mismatched.cred_def.schema_id = "S2".to_string();

        let err = CatalogueRecordBuilder::build(mismatched).unwrap_err();
        assert!(matches!(err, CuratorError::SchemaMismatch { .. }));
    }

    #[test]
    fn rejects_pair_from_different_ledgers() {
        let mut crossed = input();
        crossed.cred_def.ledger = "candy-prod".to_string();

        let err = CatalogueRecordBuilder::build(crossed).unwrap_err();
        assert!(matches!(err, CuratorError::Validation(_)));
    }
}
