//! Curator - credential catalogue service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator::{
    catalogue::parser::LedgerReferenceParser,
    catalogue::service::CatalogueService,
    catalogue::store::{CatalogueStore, InMemoryCatalogueStore},
    clients::{CredentialRegistry, HttpLedgerExplorer, InProcessRegistry, OrbitClient},
    config::Args,
    db::{MongoCatalogueStore, MongoClient},
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("curator={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Curator - Credential Catalogue");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("Ledger explorer: {}", args.ledger_explorer_url);
    match &args.orbit_api_url {
        Some(url) => info!("Orbit registry: {}", url),
        None => info!("Orbit registry: not configured"),
    }
    info!("MongoDB: {}", args.mongodb_uri);
    info!("======================================");

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => Some(client),
        Err(e) => {
            if args.dev_mode {
                warn!(
                    "MongoDB connection failed (dev mode, using in-memory store): {}",
                    e
                );
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let mongo_connected = mongo.is_some();
    let store: Arc<dyn CatalogueStore> = match mongo {
        Some(client) => Arc::new(MongoCatalogueStore::new(&client).await?),
        None => Arc::new(InMemoryCatalogueStore::new()),
    };

    // Registry client: Orbit in production, in-process fabrication in dev
    let (registry, registry_mode): (Arc<dyn CredentialRegistry>, &'static str) =
        match &args.orbit_api_url {
            Some(url) => (
                Arc::new(OrbitClient::new(
                    url,
                    args.orbit_api_key.clone(),
                    args.request_timeout_ms,
                )?),
                "orbit",
            ),
            None => {
                warn!("ORBIT_API_URL not set - registrations are fabricated in-process");
                (Arc::new(InProcessRegistry::new()), "in-process")
            }
        };

    let explorer = HttpLedgerExplorer::new(&args.ledger_explorer_url, args.request_timeout_ms)?;
    let parser = Arc::new(LedgerReferenceParser::new(Arc::new(explorer)));

    let service = Arc::new(CatalogueService::new(store, registry));

    // Predefined ecosystem tags are present from first boot
    if let Err(e) = service.seed_predefined_tags().await {
        error!("Failed to seed predefined tags: {}", e);
        std::process::exit(1);
    }
    info!("Predefined ecosystem tags seeded");

    let state = Arc::new(server::AppState::new(
        args,
        service,
        parser,
        mongo_connected,
        registry_mode,
    ));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
