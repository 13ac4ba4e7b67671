//! Configuration for Curator
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Curator - credential catalogue service
///
/// Imports schema and credential-definition metadata from an Indy ledger
/// explorer and registers it with an Orbit-style registry.
#[derive(Parser, Debug, Clone)]
#[command(name = "curator")]
#[command(about = "Credential catalogue import and registry registration service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory fallbacks for missing backends)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "curator")]
    pub mongodb_db: String,

    /// Base URL of the indyscan-style ledger explorer API
    /// Transactions are fetched from {base}/api/networks/{ledger}/ledgers/domain/txs/{seqNo}
    #[arg(long, env = "LEDGER_EXPLORER_URL", default_value = "https://candyscan.idlab.org")]
    pub ledger_explorer_url: String,

    /// Base URL of the Orbit registry API (required outside dev mode)
    /// Schemas are posted to {base}/schemas, credential definitions to
    /// {base}/credential-definitions
    #[arg(long, env = "ORBIT_API_URL")]
    pub orbit_api_url: Option<String>,

    /// API key sent to the Orbit registry as x-api-key (optional)
    #[arg(long, env = "ORBIT_API_KEY")]
    pub orbit_api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Outbound HTTP request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.orbit_api_url.is_none() {
            return Err("ORBIT_API_URL is required in production mode".to_string());
        }

        if self.ledger_explorer_url.trim().is_empty() {
            return Err("LEDGER_EXPLORER_URL must not be empty".to_string());
        }

        Ok(())
    }
}
