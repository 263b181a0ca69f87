//! Validated entry points used by the HTTP layer.
//!
//! Parameters are checked against the dimension registry before the catalog
//! is touched; a bad request never costs a query.

use std::collections::BTreeMap;

use tracing::debug;
use dashboard_common::{DashboardError, Result};

use crate::dcc::{require_dcc, DccDirectory, DccRecord, DccSource};
use crate::dimension::DimensionRegistry;
use crate::merge::apply_caps;
use crate::model::OuterGroup;
use crate::pivot::{pivot, row_label};
use crate::request::{DccStatsRequest, GroupedStatsParams, GroupedStatsRequest};
use crate::source::{StatsQuery, StatsRowSource};

/// Two-dimension stats, optionally split by DCC and capped.
pub async fn grouped_stats<C>(
    catalog: &C,
    registry: &DimensionRegistry,
    params: &GroupedStatsParams,
) -> Result<Vec<OuterGroup>>
where
    C: StatsRowSource + DccSource + ?Sized,
{
    let req = GroupedStatsRequest::validate(registry, params)?;

    let mut query = StatsQuery::new(req.variable)
        .dimension(registry.query_dimension(&req.primary))
        .dimension(registry.query_dimension(&req.secondary));
    if let Some(tertiary) = &req.tertiary {
        if tertiary.name != req.secondary.name {
            query = query.dimension(registry.query_dimension(tertiary));
        }
    }

    let needs_dccs = req.primary.is_dcc()
        || req.secondary.is_dcc()
        || req.tertiary.as_ref().is_some_and(|t| t.is_dcc());
    let dccs = if needs_dccs {
        Some(DccDirectory::build(&catalog.list_dccs().await?, registry.dcc_identity()))
    } else {
        None
    };

    let rows = catalog.fetch_stats(&query).await?;
    debug!(
        variable = %req.variable,
        grouping1 = %req.primary.name,
        grouping2 = %req.secondary.name,
        rows = rows.len(),
        "Fetched grouped stats rows"
    );

    let groups = pivot(
        &rows,
        &req.primary,
        &req.secondary,
        req.variable.count_attr(),
        req.tertiary.as_ref(),
        dccs.as_ref(),
    )?;
    Ok(apply_caps(groups, req.max_groups, req.max_atts, req.policy))
}

/// Flat `{label: count}` for one DCC over a single dimension.
pub async fn dcc_grouped_stats<C>(
    catalog: &C,
    registry: &DimensionRegistry,
    dcc_id: &str,
    variable: &str,
    grouping: &str,
) -> Result<BTreeMap<String, u64>>
where
    C: StatsRowSource + DccSource + ?Sized,
{
    let req = DccStatsRequest::validate(registry, variable, grouping)?;
    let dcc = require_dcc(catalog, dcc_id).await?;
    counts_for_dcc(catalog, registry, &dcc, req).await
}

/// Files of one DCC broken down by data type.
pub async fn dcc_file_count<C>(
    catalog: &C,
    registry: &DimensionRegistry,
    dcc: &DccRecord,
) -> Result<BTreeMap<String, u64>>
where
    C: StatsRowSource + DccSource + ?Sized,
{
    let req = DccStatsRequest::validate(registry, "files", "data_type")?;
    counts_for_dcc(catalog, registry, dcc, req).await
}

async fn counts_for_dcc<C>(
    catalog: &C,
    registry: &DimensionRegistry,
    dcc: &DccRecord,
    req: DccStatsRequest,
) -> Result<BTreeMap<String, u64>>
where
    C: StatsRowSource + DccSource + ?Sized,
{
    let dcc_dim = registry.dcc()
        .ok_or_else(|| DashboardError::Config("no DCC dimension configured".to_string()))?;
    let identity = registry.dcc_identity();
    let key = identity.key_of(dcc).ok_or_else(|| {
        DashboardError::Config(format!(
            "DCC '{}' has no {} to match stats rows on",
            dcc.id,
            identity.column()
        ))
    })?;

    let query = StatsQuery::new(req.variable)
        .dimension(registry.query_dimension(&req.grouping))
        .dimension(registry.query_dimension(dcc_dim));
    let rows = catalog.fetch_stats(&query).await?;
    debug!(dcc = %dcc.id, rows = rows.len(), "Fetched DCC stats rows");

    let attr = req.variable.count_attr();
    let mut out = BTreeMap::new();
    for row in rows.iter().filter(|r| r.label(&dcc_dim.name) == Some(key.as_str())) {
        *out.entry(row_label(row, &req.grouping, None)).or_insert(0) += row.count(attr);
    }
    Ok(out)
}

/// Display names of a DCC's top-level projects.
pub async fn top_level_projects<C>(catalog: &C, dcc: &DccRecord) -> Result<Vec<Option<String>>>
where
    C: DccSource + ?Sized,
{
    let Some(root) = dcc.project_nid else {
        return Ok(Vec::new());
    };
    let projects = catalog.list_child_projects(root).await?;
    Ok(projects.iter().map(|p| p.display_name().map(str::to_string)).collect())
}
