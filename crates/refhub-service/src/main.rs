//! Refhub service entry point.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refhub_engine::{LogNotifier, StaticDirectory};
use refhub_service::{create_router, AppState, ServiceConfig};
use refhub_store::{RocksStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,refhub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting refhub service");

    let config = ServiceConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        sweep_interval_seconds = config.sweep_interval_seconds,
        admin_configured = config.admin_api_key.is_some(),
        "Service configuration loaded"
    );

    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store: Arc<dyn Store> = Arc::new(RocksStore::open(&config.data_dir)?);

    // The employment directory is an external collaborator; until its
    // client lands, an explicitly-populated directory serves single-node
    // deployments.
    let directory = Arc::new(StaticDirectory::new());
    let notifier = Arc::new(LogNotifier);

    let state = AppState::new(store, directory, notifier, config.clone());

    if config.sweep_interval_seconds > 0 {
        let sweeper = Arc::clone(&state.sweeper);
        sweeper.spawn(Duration::from_secs(config.sweep_interval_seconds));
        tracing::info!(
            interval_seconds = config.sweep_interval_seconds,
            "Expiration sweeper scheduled"
        );
    }

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
