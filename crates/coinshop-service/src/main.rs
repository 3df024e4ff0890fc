//! Coinshop Service - HTTP API for the coin ledger
//!
//! This is the main entry point for the coinshop service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coinshop_service::{create_router, AppState, ServiceConfig};
use coinshop_store::{Database, Ledger, MemoryDatabase, PgDatabase};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,coinshop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Coinshop Service");

    let config = ServiceConfig::from_env();
    let ledger_config = config.ledger_config()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        postgres = %config.database_url.is_some(),
        catalog_items = ledger_config.catalog.len(),
        welcome_bonus = ledger_config.welcome_bonus,
        "Service configuration loaded"
    );

    let db: Arc<dyn Database> = match &config.database_url {
        Some(url) => {
            let pg = PgDatabase::connect(
                url,
                config.database_max_connections,
                config.database_connect_retries,
            )
            .await?;
            pg.migrate().await?;
            pg.sync_catalog(&ledger_config.catalog).await?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set - using the in-memory backend");
            Arc::new(MemoryDatabase::new(&ledger_config.catalog))
        }
    };

    let ledger = Arc::new(Ledger::new(db, ledger_config));
    let state = AppState::new(ledger, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
