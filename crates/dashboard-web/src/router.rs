//! Axum router - maps all URL paths to handlers.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

use crate::handlers::{
    dcc::{catalog_summary, dcc_detail, dcc_filecount, dcc_linkcount, dcc_projects, dcc_stats, list_dccs},
    stats::{stats, stats_capped},
    system::health,
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let cors = state.config.server.cors_permissive;
    let shared: SharedState = Arc::new(state);

    let router = Router::new()
        // DCCs
        .route("/dcc",                      get(list_dccs))
        .route("/dcc_info",                 get(catalog_summary))
        .route("/dcc/{dcc_id}",             get(dcc_detail))
        .route("/dcc/{dcc_id}/projects",    get(dcc_projects))
        .route("/dcc/{dcc_id}/filecount",   get(dcc_filecount))
        .route("/dcc/{dcc_id}/linkcount",   get(dcc_linkcount))
        .route("/dcc/{dcc_id}/stats/{variable}/{grouping}", get(dcc_stats))

        // Grouped stats
        .route("/stats/{variable}/{grouping1}/{grouping2}", get(stats))
        .route("/stats/{variable}/{grouping1}/{maxgroups1}/{grouping2}/{maxgroups2}", get(stats_capped))

        .route("/health", get(health));

    // Middleware
    let router = if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };
    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
