pub mod credential;
pub mod metadata;
pub mod tag;

pub use credential::{CredentialDoc, CREDENTIAL_COLLECTION};
pub use metadata::Metadata;
pub use tag::{TagDoc, TAG_COLLECTION};
