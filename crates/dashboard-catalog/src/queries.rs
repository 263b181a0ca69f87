//! Catalog-backed implementations of the stats seams.
//!
//! A `CatalogSession` pairs a cached `CatalogClient` with the credentials of
//! the request being served.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};
use dashboard_common::{ForwardHeaders, Result};
use dashboard_stats::counts::{CountQuery, DistinctCountSource, Scope};
use dashboard_stats::dcc::{DccRecord, DccSource, ProjectRecord};
use dashboard_stats::model::StatsRow;
use dashboard_stats::source::{StatsQuery, StatsRowSource};

use crate::client::CatalogClient;
use crate::path;

pub struct CatalogSession {
    client: Arc<CatalogClient>,
    headers: ForwardHeaders,
}

impl CatalogSession {
    pub fn new(client: Arc<CatalogClient>, headers: ForwardHeaders) -> Self {
        Self { client, headers }
    }

    pub fn catalog_id(&self) -> &str {
        self.client.catalog_id()
    }
}

/// Group-key value as a label. Keys may come back as numbers (nid, project
/// nid) or strings; null stays null.
pub fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Aggregate value as a count. `sum` over an empty group is null; large sums
/// may be rendered as floats.
pub fn count_of(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

pub fn parse_stats_rows(query: &StatsQuery, rows: &[Value]) -> Vec<StatsRow> {
    let attr = query.variable.count_attr();
    rows.iter()
        .map(|raw| {
            let mut row = StatsRow::new();
            for dim in &query.dimensions {
                row.set_label(&dim.name, label_of(&raw[dim.name.as_str()]));
            }
            row.set_count(attr, count_of(&raw[attr]));
            row
        })
        .collect()
}

#[async_trait]
impl StatsRowSource for CatalogSession {
    #[instrument(skip(self, query), fields(catalog = %self.catalog_id(), variable = %query.variable))]
    async fn fetch_stats(&self, query: &StatsQuery) -> Result<Vec<StatsRow>> {
        let raw = self.client.fetch(&path::stats(query), &self.headers).await?;
        Ok(parse_stats_rows(query, &raw))
    }
}

#[async_trait]
impl DccSource for CatalogSession {
    #[instrument(skip(self), fields(catalog = %self.catalog_id()))]
    async fn list_dccs(&self) -> Result<Vec<DccRecord>> {
        let raw = self.client.fetch(&path::dcc_list(None), &self.headers).await?;
        let dccs = raw.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<DccRecord>, _>>()?;
        debug!(count = dccs.len(), "Listed DCCs");
        Ok(dccs)
    }

    async fn find_dcc(&self, dcc_id: &str) -> Result<Option<DccRecord>> {
        let mut raw = self.client.fetch(&path::dcc_list(Some(dcc_id)), &self.headers).await?;
        // ambiguous ids resolve to nothing
        if raw.len() != 1 {
            return Ok(None);
        }
        Ok(raw.pop().map(serde_json::from_value::<DccRecord>).transpose()?)
    }

    async fn list_child_projects(&self, parent_project_nid: i64) -> Result<Vec<ProjectRecord>> {
        let raw = self.client.fetch(&path::child_projects(parent_project_nid), &self.headers).await?;
        let projects = raw.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<ProjectRecord>, _>>()?;
        Ok(projects)
    }
}

#[async_trait]
impl DistinctCountSource for CatalogSession {
    async fn distinct_count(&self, scope: &Scope, query: CountQuery) -> Result<Option<u64>> {
        let raw = self.client.fetch(&path::count(scope, query), &self.headers).await?;
        Ok(raw.first().and_then(|row| count_of(&row["n"])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_stats::{CountVariable, DimensionRegistry};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_labels_from_numbers_and_strings() {
        assert_eq!(label_of(&json!(42)), Some("42".to_string()));
        assert_eq!(label_of(&json!("brain")), Some("brain".to_string()));
        assert_eq!(label_of(&json!(null)), None);
    }

    #[test]
    fn test_counts_accept_floats_and_nulls() {
        assert_eq!(count_of(&json!(7)), Some(7));
        assert_eq!(count_of(&json!(1.5e3)), Some(1500));
        assert_eq!(count_of(&json!(null)), None);
    }

    #[test]
    fn test_parse_stats_rows() {
        let reg = DimensionRegistry::defaults();
        let q = StatsQuery::new(CountVariable::Subjects)
            .dimension(reg.query_dimension(reg.resolve("dcc").unwrap()))
            .dimension(reg.query_dimension(reg.resolve("sex").unwrap()));
        let raw = vec![
            json!({"dcc": 12, "sex": "female", "num_subjects": 30}),
            json!({"dcc": 12, "sex": null, "num_subjects": null}),
        ];
        let rows = parse_stats_rows(&q, &raw);
        assert_eq!(rows[0].label("dcc"), Some("12"));
        assert_eq!(rows[0].count("num_subjects"), 30);
        assert_eq!(rows[1].label("sex"), None);
        assert_eq!(rows[1].count("num_subjects"), 0);
    }
}
