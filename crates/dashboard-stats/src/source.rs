//! Seams to the catalog: the flat stats row source and the per-catalog connector.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use dashboard_common::{ForwardHeaders, Result};

use crate::counts::DistinctCountSource;
use crate::dcc::DccSource;
use crate::dimension::QueryDimension;
use crate::model::{CountVariable, StatsRow};

/// An aggregation request: one count variable grouped by one or more dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub variable: CountVariable,
    pub dimensions: Vec<QueryDimension>,
}

impl StatsQuery {
    pub fn new(variable: CountVariable) -> Self {
        Self { variable, dimensions: Vec::new() }
    }

    pub fn dimension(mut self, dimension: QueryDimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.iter().any(|d| d.name == name)
    }
}

/// Produces flat rows for a stats query. Each row carries one raw label per
/// query dimension (keyed by dimension name) and the variable's count attribute.
#[async_trait]
pub trait StatsRowSource: Send + Sync {
    async fn fetch_stats(&self, query: &StatsQuery) -> Result<Vec<StatsRow>>;
}

/// Everything the HTTP layer needs from one opened catalog.
pub trait Catalog: StatsRowSource + DccSource + DistinctCountSource {}

impl<T: StatsRowSource + DccSource + DistinctCountSource + ?Sized> Catalog for T {}

/// Registry catalog record describing a submitted datapackage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapackage {
    #[serde(rename = "RID")]
    pub rid: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub submission_time: Option<String>,
}

/// Opens catalogs by id.
#[async_trait]
pub trait CatalogConnector: Send + Sync {
    /// Open (or reuse) a handle to `catalog_id`. Fails with `CatalogNotFound`
    /// when the catalog does not exist.
    async fn connect(&self, catalog_id: &str, headers: &ForwardHeaders) -> Result<Arc<dyn Catalog>>;

    /// Look up the datapackage that produced `catalog_id` in the registry catalog.
    async fn find_datapackage(&self, catalog_id: &str, headers: &ForwardHeaders) -> Result<Option<Datapackage>>;

    /// Ids of catalogs with a cached handle.
    async fn open_catalogs(&self) -> Vec<String>;
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Returns canned rows, counting calls and keeping the last query.
#[derive(Default)]
pub struct MockStatsSource {
    rows: Vec<StatsRow>,
    calls: AtomicUsize,
    last_query: Mutex<Option<StatsQuery>>,
}

impl MockStatsSource {
    pub fn new(rows: Vec<StatsRow>) -> Self {
        Self { rows, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<StatsQuery> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }
}

#[async_trait]
impl StatsRowSource for MockStatsSource {
    async fn fetch_stats(&self, query: &StatsQuery) -> Result<Vec<StatsRow>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some(query.clone());
        }
        Ok(self.rows.clone())
    }
}
