//! DCC endpoints: listing, detail, projects and per-DCC counts.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use dashboard_common::DashboardError;
use dashboard_stats::counts::{CountField, CountKind, EntityCountAggregator, EntityCounts, Scope};
use dashboard_stats::dcc::{require_dcc, DccRecord, DccSource};
use dashboard_stats::source::CatalogConnector;
use dashboard_stats::request::DccStatsRequest;
use dashboard_stats::service::{dcc_file_count, dcc_grouped_stats, top_level_projects};

use crate::error::ApiResult;
use crate::handlers::{open_catalog, CatalogParams};
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct DccSummary {
    pub id: String,
    pub abbreviation: Option<String>,
    pub complete_name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub nid: i64,
}

impl From<DccRecord> for DccSummary {
    fn from(dcc: DccRecord) -> Self {
        Self {
            id: dcc.id,
            abbreviation: dcc.abbreviation,
            complete_name: dcc.name,
            description: dcc.description,
            url: dcc.url,
            nid: dcc.nid,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogSummary {
    pub catalog_id: String,
    pub subject_count: u64,
    pub biosample_count: u64,
    pub file_count: u64,
    pub project_count: u64,
    pub anatomy_count: u64,
    pub assay_count: u64,
    pub disease_count: u64,
    pub gene_count: u64,
    pub compound_count: u64,
}

#[derive(Debug, Serialize)]
pub struct DccDetail {
    pub id: String,
    pub abbreviation: Option<String>,
    pub complete_name: Option<String>,
    pub description: Option<String>,
    /// No PI data in the current schema, only a primary contact.
    pub principal_investigators: Vec<String>,
    pub url: Option<String>,
    pub project_count: u64,
    pub toplevel_project_count: u64,
    pub subject_count: u64,
    pub biosample_count: u64,
    pub file_count: u64,
    pub last_updated: Option<String>,
    pub nid: i64,
    #[serde(rename = "datapackage_RID")]
    pub datapackage_rid: Option<String>,
}

fn count(counts: &EntityCounts, field: CountField) -> u64 {
    counts.get(field).unwrap_or(0)
}

/// GET /dcc
pub async fn list_dccs(
    State(state): State<SharedState>,
    Query(params): Query<CatalogParams>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<DccSummary>>> {
    let handle = open_catalog(&state, &params, &headers).await?;
    let dccs = handle.catalog.list_dccs().await?;
    Ok(Json(dccs.into_iter().map(DccSummary::from).collect()))
}

/// GET /dcc_info - whole-catalog summary
pub async fn catalog_summary(
    State(state): State<SharedState>,
    Query(params): Query<CatalogParams>,
    headers: HeaderMap,
) -> ApiResult<Json<CatalogSummary>> {
    let handle = open_catalog(&state, &params, &headers).await?;
    let kinds = [
        CountKind::Subject,
        CountKind::Biosample,
        CountKind::File,
        CountKind::Project,
        CountKind::Anatomy,
        CountKind::AssayType,
        CountKind::Disease,
        CountKind::Gene,
        CountKind::Compound,
    ];
    let counts = EntityCountAggregator::new(handle.catalog.as_ref())
        .compute(&Scope::Catalog, Some(&kinds[..]))
        .await?;

    Ok(Json(CatalogSummary {
        catalog_id: handle.catalog_id,
        subject_count: count(&counts, CountField::SubjectCount),
        biosample_count: count(&counts, CountField::BiosampleCount),
        file_count: count(&counts, CountField::FileCount),
        project_count: count(&counts, CountField::ProjectCount),
        anatomy_count: count(&counts, CountField::AnatomyCount),
        assay_count: count(&counts, CountField::AssayCount),
        disease_count: count(&counts, CountField::DiseaseCount),
        gene_count: count(&counts, CountField::GeneCount),
        compound_count: count(&counts, CountField::CompoundCount),
    }))
}

/// GET /dcc/{dcc_id}
pub async fn dcc_detail(
    State(state): State<SharedState>,
    Path(dcc_id): Path<String>,
    Query(params): Query<CatalogParams>,
    headers: HeaderMap,
) -> ApiResult<Json<DccDetail>> {
    let handle = open_catalog(&state, &params, &headers).await?;
    let dcc = require_dcc(handle.catalog.as_ref(), &dcc_id).await?;

    let kinds = [CountKind::Subject, CountKind::File, CountKind::Biosample, CountKind::Project];
    let counts = EntityCountAggregator::new(handle.catalog.as_ref())
        .compute(&Scope::Dcc(dcc.clone()), Some(&kinds[..]))
        .await?;

    let datapackage = state.connector
        .find_datapackage(&handle.catalog_id, &handle.headers)
        .await?;
    debug!(dcc = %dcc.id, found = datapackage.is_some(), "Datapackage lookup");
    let (datapackage_rid, last_updated) = match datapackage {
        Some(dp) => (Some(dp.rid), dp.submission_time),
        None => (None, None),
    };

    Ok(Json(DccDetail {
        project_count: count(&counts, CountField::ProjectCount),
        toplevel_project_count: count(&counts, CountField::ToplevelProjectCount),
        subject_count: count(&counts, CountField::SubjectCount),
        biosample_count: count(&counts, CountField::BiosampleCount),
        file_count: count(&counts, CountField::FileCount),
        principal_investigators: Vec::new(),
        last_updated,
        datapackage_rid,
        id: dcc.id,
        abbreviation: dcc.abbreviation,
        complete_name: dcc.name,
        description: dcc.description,
        url: dcc.url,
        nid: dcc.nid,
    }))
}

/// GET /dcc/{dcc_id}/projects
pub async fn dcc_projects(
    State(state): State<SharedState>,
    Path(dcc_id): Path<String>,
    Query(params): Query<CatalogParams>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Option<String>>>> {
    let handle = open_catalog(&state, &params, &headers).await?;
    let dcc = require_dcc(handle.catalog.as_ref(), &dcc_id).await?;
    Ok(Json(top_level_projects(handle.catalog.as_ref(), &dcc).await?))
}

/// GET /dcc/{dcc_id}/filecount - files by data type
pub async fn dcc_filecount(
    State(state): State<SharedState>,
    Path(dcc_id): Path<String>,
    Query(params): Query<CatalogParams>,
    headers: HeaderMap,
) -> ApiResult<Json<BTreeMap<String, u64>>> {
    let handle = open_catalog(&state, &params, &headers).await?;
    let dcc = require_dcc(handle.catalog.as_ref(), &dcc_id).await?;
    Ok(Json(dcc_file_count(handle.catalog.as_ref(), &state.dimensions, &dcc).await?))
}

/// GET /dcc/{dcc_id}/linkcount - entity and link counts plus `nid`
pub async fn dcc_linkcount(
    State(state): State<SharedState>,
    Path(dcc_id): Path<String>,
    Query(params): Query<CatalogParams>,
    headers: HeaderMap,
) -> ApiResult<Json<Map<String, Value>>> {
    let handle = open_catalog(&state, &params, &headers).await?;
    let dcc = require_dcc(handle.catalog.as_ref(), &dcc_id).await?;
    let nid = dcc.nid;
    let counts = EntityCountAggregator::new(handle.catalog.as_ref())
        .compute(&Scope::Dcc(dcc), Some(&CountKind::ENTITIES[..]))
        .await?;

    let mut out = match serde_json::to_value(&counts).map_err(DashboardError::from)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    out.insert("nid".to_string(), Value::from(nid));
    Ok(Json(out))
}

/// GET /dcc/{dcc_id}/stats/{variable}/{grouping}
pub async fn dcc_stats(
    State(state): State<SharedState>,
    Path((dcc_id, variable, grouping)): Path<(String, String, String)>,
    Query(params): Query<CatalogParams>,
    headers: HeaderMap,
) -> ApiResult<Json<BTreeMap<String, u64>>> {
    // reject bad names before touching the catalog
    DccStatsRequest::validate(&state.dimensions, &variable, &grouping)?;
    let handle = open_catalog(&state, &params, &headers).await?;
    let counts = dcc_grouped_stats(
        handle.catalog.as_ref(),
        &state.dimensions,
        &dcc_id,
        &variable,
        &grouping,
    )
    .await?;
    Ok(Json(counts))
}
