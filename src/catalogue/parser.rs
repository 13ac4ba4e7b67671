//! Ledger reference parser
//!
//! Resolves explorer page URLs into structured schema or
//! credential-definition metadata. The user pastes an indyscan-style
//! transaction URL (`https://{host}/tx/{LEDGER}/domain/{seqNo}`); the parser
//! derives the explorer's JSON endpoint from it, fetches the raw transaction
//! envelope through the `LedgerExplorer` trait and validates the transaction
//! type before extracting fields.
//!
//! Schema transactions are ledger type 101, credential definitions type 102.
//! A credential definition must reference the schema the user already parsed;
//! anything else is rejected rather than silently accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::clients::ledger::LedgerExplorer;
use crate::types::{CuratorError, Result};

const TXN_TYPE_SCHEMA: &str = "101";
const TXN_TYPE_CLAIM_DEF: &str = "102";

// ============================================================================
// Parsed outputs
// ============================================================================

/// Schema metadata extracted from a ledger transaction. Attribute order is
/// preserved exactly as declared on the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSchema {
    pub schema_id: String,
    pub name: String,
    pub version: String,
    pub attributes: Vec<String>,
    pub ledger: String,
    pub seq_no: u64,
}

/// Credential-definition metadata extracted from a ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCredDef {
    pub cred_def_id: String,
    pub schema_id: String,
    pub tag: String,
    pub support_revocation: bool,
    pub ledger: String,
    pub seq_no: u64,
}

// ============================================================================
// URL resolution
// ============================================================================

/// A supported explorer page URL resolved to (ledger, seqNo)
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRef {
    pub ledger: String,
    pub seq_no: u64,
}

impl LedgerRef {
    /// Parse an explorer transaction page URL of the form
    /// `https://{host}/tx/{LEDGER}/domain/{seqNo}`. The network segment is
    /// normalized to lowercase-hyphen form (`CANDY_TEST` becomes
    /// `candy-test`) and used verbatim against the explorer API.
    pub fn from_url(url: &str) -> Result<Self> {
        let unsupported = || CuratorError::UnsupportedUrl(url.to_string());

        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(unsupported)?;

        // Drop query and fragment, then split host from path
        let rest = rest.split(|c| c == '?' || c == '#').next().unwrap_or(rest);
        let mut parts = rest.splitn(2, '/');
        let host = parts.next().unwrap_or_default();
        let path = parts.next().ok_or_else(unsupported)?;
        if host.is_empty() {
            return Err(unsupported());
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["tx", network, "domain", seq] => {
                let seq_no = seq.parse::<u64>().map_err(|_| unsupported())?;
                Ok(LedgerRef {
                    ledger: network.to_lowercase().replace('_', "-"),
                    seq_no,
                })
            }
            _ => Err(unsupported()),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

pub struct LedgerReferenceParser {
    explorer: Arc<dyn LedgerExplorer>,
}

impl LedgerReferenceParser {
    pub fn new(explorer: Arc<dyn LedgerExplorer>) -> Self {
        Self { explorer }
    }

    /// Resolve a schema transaction URL into parsed schema metadata
    pub async fn parse_schema(&self, url: &str) -> Result<ParsedSchema> {
        let ledger_ref = LedgerRef::from_url(url)?;
        let txn = self
            .explorer
            .fetch_txn(&ledger_ref.ledger, ledger_ref.seq_no)
            .await?;

        let found = txn_type(&txn)?;
        if found != TXN_TYPE_SCHEMA {
            return Err(CuratorError::WrongTransactionType {
                expected: format!("{} (SCHEMA)", TXN_TYPE_SCHEMA),
                found,
            });
        }

        let parts = schema_parts(&txn)?;
        debug!(
            schema_id = %parts.schema_id,
            ledger = %ledger_ref.ledger,
            "parsed schema transaction"
        );

        Ok(ParsedSchema {
            schema_id: parts.schema_id,
            name: parts.name,
            version: parts.version,
            attributes: parts.attributes,
            ledger: ledger_ref.ledger,
            seq_no: ledger_ref.seq_no,
        })
    }

    /// Resolve a credential-definition transaction URL. `expected_schema_id`
    /// must come from a prior successful `parse_schema`; a definition
    /// referencing any other schema fails with `SchemaMismatch`.
    pub async fn parse_cred_def(
        &self,
        url: &str,
        expected_schema_id: &str,
    ) -> Result<ParsedCredDef> {
        let ledger_ref = LedgerRef::from_url(url)?;
        let txn = self
            .explorer
            .fetch_txn(&ledger_ref.ledger, ledger_ref.seq_no)
            .await?;

        let found = txn_type(&txn)?;
        if found != TXN_TYPE_CLAIM_DEF {
            return Err(CuratorError::WrongTransactionType {
                expected: format!("{} (CLAIM_DEF)", TXN_TYPE_CLAIM_DEF),
                found,
            });
        }

        let data = txn
            .pointer("/txn/data")
            .ok_or_else(|| malformed("txn.data"))?;

        let tag = data
            .get("tag")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();
        let support_revocation = data
            .pointer("/data/revocation")
            .map(|v| !v.is_null())
            .unwrap_or(false);
        let ref_seq = data.get("ref").and_then(Value::as_u64);

        // Explorers that enrich the payload carry the resolved schema id;
        // otherwise follow the ref sequence number with a second fetch.
        let schema_id = match data.get("refSchemaId").and_then(Value::as_str) {
            Some(resolved) => resolved.to_string(),
            None => {
                let seq = ref_seq.ok_or_else(|| malformed("txn.data.ref"))?;
                self.resolve_schema_id(&ledger_ref.ledger, seq).await?
            }
        };

        if schema_id != expected_schema_id {
            return Err(CuratorError::SchemaMismatch {
                expected: expected_schema_id.to_string(),
                found: schema_id,
            });
        }

        let cred_def_id = match txn.pointer("/txnMetadata/txnId").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let from = txn
                    .pointer("/txn/metadata/from")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("txnMetadata.txnId or txn.metadata.from"))?;
                let signature_type = data
                    .get("signature_type")
                    .and_then(Value::as_str)
                    .unwrap_or("CL");
                let seq = ref_seq.ok_or_else(|| malformed("txn.data.ref"))?;
                format!("{}:3:{}:{}:{}", from, signature_type, seq, tag)
            }
        };

        debug!(
            cred_def_id = %cred_def_id,
            schema_id = %schema_id,
            "parsed credential-definition transaction"
        );

        Ok(ParsedCredDef {
            cred_def_id,
            schema_id,
            tag,
            support_revocation,
            ledger: ledger_ref.ledger,
            seq_no: ledger_ref.seq_no,
        })
    }

    /// Follow a credential definition's `ref` to the schema transaction it
    /// binds and return that schema's id
    async fn resolve_schema_id(&self, ledger: &str, seq_no: u64) -> Result<String> {
        let txn = self.explorer.fetch_txn(ledger, seq_no).await?;
        if txn_type(&txn)? != TXN_TYPE_SCHEMA {
            return Err(CuratorError::MalformedTxn(format!(
                "ref {} does not point at a schema transaction",
                seq_no
            )));
        }
        Ok(schema_parts(&txn)?.schema_id)
    }
}

// ============================================================================
// Transaction envelope helpers
// ============================================================================

struct SchemaParts {
    schema_id: String,
    name: String,
    version: String,
    attributes: Vec<String>,
}

fn schema_parts(txn: &Value) -> Result<SchemaParts> {
    let data = txn
        .pointer("/txn/data/data")
        .ok_or_else(|| malformed("txn.data.data"))?;

    let name = data
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("txn.data.data.name"))?
        .to_string();
    let version = data
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("txn.data.data.version"))?
        .to_string();

    let attributes = data
        .get("attr_names")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("txn.data.data.attr_names"))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed("txn.data.data.attr_names entry"))
        })
        .collect::<Result<Vec<String>>>()?;
    if attributes.is_empty() {
        return Err(CuratorError::MalformedTxn(
            "schema declares no attributes".to_string(),
        ));
    }

    let schema_id = match txn.pointer("/txnMetadata/txnId").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => {
            let from = txn
                .pointer("/txn/metadata/from")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("txnMetadata.txnId or txn.metadata.from"))?;
            format!("{}:2:{}:{}", from, name, version)
        }
    };

    Ok(SchemaParts {
        schema_id,
        name,
        version,
        attributes,
    })
}

/// Transaction type, tolerant of explorers serving it as string or number
fn txn_type(txn: &Value) -> Result<String> {
    match txn.pointer("/txn/type") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(malformed("txn.type")),
    }
}

fn malformed(field: &str) -> CuratorError {
    CuratorError::MalformedTxn(format!("missing {}", field))
}
