//! External collaborators behind traits
//!
//! The ledger explorer (read-only metadata source) and the credential
//! registry (Orbit). Both are trait objects so the pipeline can run against
//! mocks in tests and the in-process registry in dev mode.

pub mod ledger;
pub mod orbit;

pub use ledger::{HttpLedgerExplorer, LedgerExplorer};
pub use orbit::{
    CredDefRegistration, CredentialRegistry, InProcessRegistry, OrbitClient, RegistryExchange,
    SchemaRegistration,
};
