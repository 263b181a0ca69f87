//! Two-dimension grouped statistics.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use dashboard_common::{DashboardError, Result};
use dashboard_stats::request::{GroupedStatsParams, GroupedStatsRequest};
use dashboard_stats::service::grouped_stats;
use dashboard_stats::{MergePolicy, OuterGroup};

use crate::error::ApiResult;
use crate::handlers::{open_catalog, CatalogParams};
use crate::state::{AppState, SharedState};

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    #[serde(rename = "catalogId")]
    pub catalog_id: Option<String>,
    #[serde(rename = "includeDCC")]
    pub include_dcc: Option<String>,
    #[serde(rename = "mergePolicy")]
    pub merge_policy: Option<String>,
}

impl StatsParams {
    fn catalog(&self) -> CatalogParams {
        CatalogParams { catalog_id: self.catalog_id.clone() }
    }
}

fn parse_flag(name: &str, raw: Option<&str>) -> Result<bool> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(DashboardError::invalid(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}

/// Caps arrive as path segments; anything non-numeric is a parameter error.
fn parse_int(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| DashboardError::invalid(format!("{} must be an integer", name)))
}

async fn run(
    state: &AppState,
    mut params: GroupedStatsParams,
    query: &StatsParams,
    headers: &HeaderMap,
) -> ApiResult<Json<Vec<OuterGroup>>> {
    params.policy = match query.merge_policy.as_deref() {
        Some(raw) => raw.parse()?,
        None => state.config.stats.merge_policy,
    };

    // bad parameters never cost a catalog round trip
    GroupedStatsRequest::validate(&state.dimensions, &params)?;

    let handle = open_catalog(state, &query.catalog(), headers).await?;
    let groups = grouped_stats(handle.catalog.as_ref(), &state.dimensions, &params).await?;
    Ok(Json(groups))
}

/// GET /stats/{variable}/{grouping1}/{grouping2}
pub async fn stats(
    State(state): State<SharedState>,
    Path((variable, grouping1, grouping2)): Path<(String, String, String)>,
    Query(query): Query<StatsParams>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<OuterGroup>>> {
    let params = GroupedStatsParams {
        variable,
        grouping1,
        grouping2,
        include_dcc: parse_flag("includeDCC", query.include_dcc.as_deref())?,
        ..Default::default()
    };
    run(&state, params, &query, &headers).await
}

/// GET /stats/{variable}/{grouping1}/{maxgroups1}/{grouping2}/{maxgroups2}
pub async fn stats_capped(
    State(state): State<SharedState>,
    Path((variable, grouping1, max1, grouping2, max2)): Path<(String, String, String, String, String)>,
    Query(query): Query<StatsParams>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<OuterGroup>>> {
    let params = GroupedStatsParams {
        variable,
        grouping1,
        grouping2,
        max_groups1: Some(parse_int("maxgroups1", &max1)?),
        max_groups2: Some(parse_int("maxgroups2", &max2)?),
        include_dcc: false,
        policy: MergePolicy::default(),
    };
    run(&state, params, &query, &headers).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("includeDCC", None).unwrap());
        assert!(parse_flag("includeDCC", Some("True")).unwrap());
        assert!(!parse_flag("includeDCC", Some("0")).unwrap());
        let err = parse_flag("includeDCC", Some("maybe")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_parse_int_rejects_words() {
        assert_eq!(parse_int("maxgroups1", "-1").unwrap(), -1);
        assert_eq!(
            parse_int("maxgroups2", "ten").unwrap_err().to_string(),
            "maxgroups2 must be an integer"
        );
    }
}
