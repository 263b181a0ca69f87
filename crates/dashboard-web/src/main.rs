//! CFDE Dashboard API server
//!
//! Run with: cargo run -p dashboard-web

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use dashboard_catalog::CatalogRegistry;
use dashboard_web::config::Config;
use dashboard_web::router::build_router;
use dashboard_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dashboard=debug,info")),
        )
        .init();

    info!("Starting CFDE dashboard API...");

    let config = Config::load()?;
    info!(
        servername = %config.deriva.servername,
        default_catalog = %config.deriva.default_catalog_id,
        "Loaded configuration"
    );

    let registry = Arc::new(CatalogRegistry::new(config.catalog_settings())?);
    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::new(registry.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.close().await;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
