//! Credential catalogue domain
//!
//! The import and registration pipeline, leaf-first: URL parsing, record
//! assembly, two-phase registry registration, issuance cloning, the issuance
//! gate, and the persistence seam. `service` composes them for the routes.

pub mod builder;
pub mod cloning;
pub mod issuance;
pub mod parser;
pub mod record;
pub mod registration;
pub mod service;
pub mod store;
pub mod tags;

pub use builder::{CatalogueRecordBuilder, ImportInput};
pub use cloning::{CloneForIssuanceService, CloneOptions};
pub use issuance::{IssuanceEligibilityGate, IssuanceState};
pub use parser::{LedgerReferenceParser, ParsedCredDef, ParsedSchema};
pub use record::{CatalogueCredential, CloneForIssuance, OperationLog};
pub use registration::{RegistrationCoordinator, RegistrationOutcome, RegistrationPhase};
pub use service::{CatalogueService, ClassificationUpdate};
pub use store::{CatalogueStore, CredentialPatch, InMemoryCatalogueStore, RoundLocks};
pub use tags::EcosystemTag;
