//! Shared error taxonomy and result alias.
//!
//! Every failure in the import/registration pipeline is data: parse and
//! validation errors abort the current step, registration failures are
//! captured as OperationLogs on the record, and nothing here terminates the
//! process.

use thiserror::Error;

use crate::catalogue::record::OperationLog;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CuratorError>;

/// Error taxonomy for the catalogue service
#[derive(Debug, Error)]
pub enum CuratorError {
    /// URL does not identify a ledger transaction on a supported explorer
    #[error("unsupported ledger reference URL: {0}")]
    UnsupportedUrl(String),

    /// Explorer was unreachable or returned an unusable response
    #[error("failed to fetch ledger transaction: {0}")]
    FetchFailed(String),

    /// Transaction exists but is not of the expected ledger type
    #[error("wrong transaction type: expected {expected}, found {found}")]
    WrongTransactionType { expected: String, found: String },

    /// Transaction payload is missing fields the parser requires
    #[error("malformed ledger transaction: {0}")]
    MalformedTxn(String),

    /// Credential definition does not reference the schema shown to the user
    #[error("credential definition references schema {found}, expected {expected}")]
    SchemaMismatch { expected: String, found: String },

    /// Missing or invalid classification before persistence
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record for this (ledger, schemaId, credDefId) already exists
    #[error("credential already imported: {0}")]
    DuplicateImport(String),

    /// Registry call failed; the full per-call diagnostic rides along
    #[error("registry registration failed: {}", .0.describe())]
    Registration(Box<OperationLog>),

    /// Derived clone schema name/version already exists on the ledger
    #[error("clone schema {name} {version} already exists on the ledger")]
    CloneCollision { name: String, version: String },

    /// Issuance toggle requires an existing clone
    #[error("credential {0} has no clone for issuance")]
    NotCloned(String),

    /// Record or tag lookup miss
    #[error("not found: {0}")]
    NotFound(String),

    /// Predefined ecosystem tags cannot be deleted
    #[error("tag {0} is predefined and cannot be deleted")]
    TagProtected(String),

    /// Store-level failure (Mongo or in-memory)
    #[error("database error: {0}")]
    Database(String),

    /// Socket/listener failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for serialization and wiring failures
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_error_names_both_ids() {
        let err = CuratorError::SchemaMismatch {
            expected: "S1".to_string(),
            found: "S2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("S1"));
        assert!(msg.contains("S2"));
    }
}
