//! Ledger explorer client
//!
//! Read-only access to an indyscan-style ledger explorer. The explorer serves
//! domain-ledger transactions as JSON at
//! `{base}/api/networks/{ledger}/ledgers/domain/txs/{seqNo}`; the parser
//! consumes the raw transaction envelope and never writes anything.
//!
//! The trait exists so the import pipeline can be tested against canned
//! transactions without a network.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::types::{CuratorError, Result};

/// Read-only view of a ledger explorer
#[async_trait]
pub trait LedgerExplorer: Send + Sync {
    /// Fetch one domain-ledger transaction by sequence number
    async fn fetch_txn(&self, ledger: &str, seq_no: u64) -> Result<Value>;
}

/// HTTP implementation backed by reqwest
pub struct HttpLedgerExplorer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerExplorer {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| CuratorError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LedgerExplorer for HttpLedgerExplorer {
    async fn fetch_txn(&self, ledger: &str, seq_no: u64) -> Result<Value> {
        let url = format!(
            "{}/api/networks/{}/ledgers/domain/txs/{}",
            self.base_url, ledger, seq_no
        );

        debug!(ledger = %ledger, seq_no = seq_no, "fetching ledger transaction");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CuratorError::FetchFailed(format!("explorer unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CuratorError::FetchFailed(format!(
                "explorer returned HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CuratorError::FetchFailed(format!("explorer response not JSON: {}", e)))
    }
}
