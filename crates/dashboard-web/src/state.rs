//! Shared application state for the web server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashboard_stats::{CatalogConnector, DimensionRegistry};

use crate::config::Config;

/// Shared state injected into every Axum handler.
pub struct AppState {
    /// Opens catalogs; the live server hands in a `CatalogRegistry`.
    pub connector: Arc<dyn CatalogConnector>,
    pub dimensions: DimensionRegistry,
    pub config: Config,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(connector: Arc<dyn CatalogConnector>, config: Config) -> Self {
        Self {
            connector,
            dimensions: config.dimension_registry(),
            config,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;
