//! Liveness and open-catalog status.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use dashboard_stats::CatalogConnector;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub default_catalog_id: String,
    pub open_catalogs: Vec<String>,
    pub started_at: DateTime<Utc>,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        default_catalog_id: state.config.deriva.default_catalog_id.clone(),
        open_catalogs: state.connector.open_catalogs().await,
        started_at: state.started_at,
    })
}
