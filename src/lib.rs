//! Curator - credential catalogue service
//!
//! Curator imports verifiable-credential building blocks (schemas and
//! credential definitions) from an Indy ledger explorer, catalogues them
//! with ecosystem classification, and registers them with an Orbit-style
//! credential-management registry in a strict two-phase sequence.
//!
//! ## Pipeline
//!
//! ```text
//! explorer URL → parser → builder → [registry registration] → store
//!                                        │
//!                              clone-for-issuance round
//!                              (second registration under
//!                               a derived schema version)
//! ```
//!
//! Registration failures are data: a credential whose registry round failed
//! is still persisted, with per-call OperationLogs, and can be retried
//! without re-parsing the ledger.

pub mod catalogue;
pub mod clients;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CuratorError, Result};
