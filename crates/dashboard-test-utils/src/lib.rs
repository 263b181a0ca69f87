//! dashboard-test-utils - In-memory catalog and connector for tests.
//!
//! `FakeCatalog` answers every stats query with the same canned rows; the
//! rows carry labels for every dimension a test might group by, and each
//! consumer picks the ones it asked for.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashboard_common::{DashboardError, ForwardHeaders, Result};
use dashboard_stats::counts::{CountQuery, DistinctCountSource, Scope};
use dashboard_stats::dcc::{dcc_record, DccRecord, DccSource, ProjectRecord};
use dashboard_stats::model::StatsRow;
use dashboard_stats::source::{Catalog, CatalogConnector, Datapackage, StatsQuery, StatsRowSource};

// ── Row builders ────────────────────────────────────────────────────────────

/// A stats row from `(dimension, label)` pairs and one count attribute.
pub fn stats_row(labels: &[(&str, Option<&str>)], attr: &str, count: u64) -> StatsRow {
    labels.iter()
        .fold(StatsRow::new(), |row, (dim, label)| row.with_label(dim, *label))
        .with_count(attr, Some(count))
}

pub fn project(name: Option<&str>, abbreviation: Option<&str>, id: Option<&str>) -> ProjectRecord {
    ProjectRecord {
        id: id.map(str::to_string),
        name: name.map(str::to_string),
        abbreviation: abbreviation.map(str::to_string),
        description: None,
    }
}

// ── Fake catalog ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeCatalog {
    rows: Vec<StatsRow>,
    dccs: Vec<DccRecord>,
    children: HashMap<i64, Vec<ProjectRecord>>,
    counts: HashMap<CountQuery, u64>,
    failure: Option<(u16, String)>,
    stats_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<StatsRow>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn with_dcc(mut self, dcc: DccRecord) -> Self {
        self.dccs.push(dcc);
        self
    }

    pub fn with_child(mut self, parent_nid: i64, project: ProjectRecord) -> Self {
        self.children.entry(parent_nid).or_default().push(project);
        self
    }

    pub fn with_count(mut self, query: CountQuery, n: u64) -> Self {
        self.counts.insert(query, n);
        self
    }

    /// Make every stats query fail as the catalog would.
    pub fn failing(mut self, status: u16, message: &str) -> Self {
        self.failure = Some((status, message.to_string()));
        self
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsRowSource for FakeCatalog {
    async fn fetch_stats(&self, _query: &StatsQuery) -> Result<Vec<StatsRow>> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, message)) = &self.failure {
            return Err(DashboardError::upstream(Some(*status), message.clone()));
        }
        Ok(self.rows.clone())
    }
}

#[async_trait]
impl DccSource for FakeCatalog {
    async fn list_dccs(&self) -> Result<Vec<DccRecord>> {
        Ok(self.dccs.clone())
    }

    async fn list_child_projects(&self, parent_project_nid: i64) -> Result<Vec<ProjectRecord>> {
        Ok(self.children.get(&parent_project_nid).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DistinctCountSource for FakeCatalog {
    async fn distinct_count(&self, _scope: &Scope, query: CountQuery) -> Result<Option<u64>> {
        Ok(self.counts.get(&query).copied())
    }
}

// ── Fake connector ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeConnector {
    catalogs: HashMap<String, Arc<FakeCatalog>>,
    datapackages: HashMap<String, Datapackage>,
    opened: Mutex<Vec<String>>,
    last_headers: Mutex<Option<ForwardHeaders>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog_id: &str, catalog: FakeCatalog) -> Self {
        self.catalogs.insert(catalog_id.to_string(), Arc::new(catalog));
        self
    }

    pub fn with_datapackage(mut self, catalog_id: &str, rid: &str, submitted: &str) -> Self {
        self.datapackages.insert(catalog_id.to_string(), Datapackage {
            rid: rid.to_string(),
            id: Some(format!("datapackage-{}", catalog_id)),
            submission_time: Some(submitted.to_string()),
        });
        self
    }

    pub fn catalog(&self, catalog_id: &str) -> Option<Arc<FakeCatalog>> {
        self.catalogs.get(catalog_id).cloned()
    }

    /// Credentials seen on the most recent connect.
    pub fn last_headers(&self) -> Option<ForwardHeaders> {
        self.last_headers.lock().ok().and_then(|h| h.clone())
    }
}

#[async_trait]
impl CatalogConnector for FakeConnector {
    async fn connect(&self, catalog_id: &str, headers: &ForwardHeaders) -> Result<Arc<dyn Catalog>> {
        if let Ok(mut last) = self.last_headers.lock() {
            *last = Some(headers.clone());
        }
        let catalog = self.catalogs.get(catalog_id)
            .cloned()
            .ok_or_else(|| DashboardError::CatalogNotFound(catalog_id.to_string()))?;
        if let Ok(mut opened) = self.opened.lock() {
            if !opened.iter().any(|id| id == catalog_id) {
                opened.push(catalog_id.to_string());
            }
        }
        let catalog: Arc<dyn Catalog> = catalog;
        Ok(catalog)
    }

    async fn find_datapackage(&self, catalog_id: &str, _headers: &ForwardHeaders) -> Result<Option<Datapackage>> {
        Ok(self.datapackages.get(catalog_id).cloned())
    }

    async fn open_catalogs(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

// ── Fixtures ────────────────────────────────────────────────────────────────

pub const HMP_ID: &str = "cfde_registry_dcc:hmp";
pub const FOURDN_ID: &str = "cfde_registry_dcc:4dn";

pub fn hmp() -> DccRecord {
    dcc_record(HMP_ID, 1, "HMP", 10)
}

pub fn fourdn() -> DccRecord {
    dcc_record(FOURDN_ID, 2, "4DN", 20)
}

/// Two DCCs, file rows over dcc/anatomy/species/data_type, a few projects
/// and a full set of counts.
pub fn sample_catalog() -> FakeCatalog {
    let r = |dcc: &str, anatomy: Option<&str>, species: Option<&str>, data_type: Option<&str>, n: u64| {
        stats_row(
            &[
                ("dcc", Some(dcc)),
                ("anatomy", anatomy),
                ("species", species),
                ("data_type", data_type),
            ],
            "num_files",
            n,
        )
    };
    FakeCatalog::new()
        .with_dcc(hmp())
        .with_dcc(fourdn())
        .with_rows(vec![
            r("10", Some("stomach"), Some("Homo sapiens"), Some("sequence"), 120),
            r("10", Some("skin"), Some("Homo sapiens"), Some("sequence"), 40),
            r("20", Some("brain"), Some("Mus musculus"), Some("image"), 15),
            r("20", Some("brain"), Some("Homo sapiens"), None, 5),
            r("10", None, Some("Homo sapiens"), Some("null"), 3),
        ])
        .with_child(10, project(Some("HMP Phase 1"), None, Some("hmp:1")))
        .with_child(10, project(None, Some("iHMP"), Some("hmp:2")))
        .with_count(CountQuery::ProjectMembers, 4)
        .with_count(CountQuery::TopLevelProjects, 2)
        .with_count(CountQuery::Subjects, 300)
        .with_count(CountQuery::Biosamples, 900)
        .with_count(CountQuery::Files, 183)
        .with_count(CountQuery::SubjectsWithBiosamples, 250)
        .with_count(CountQuery::FilesWithSubjects, 100)
        .with_count(CountQuery::VocabularyTerms("anatomy"), 12)
}

/// Connector with `sample_catalog` as catalog "1" and a registry entry for it.
pub fn sample_connector() -> FakeConnector {
    FakeConnector::new()
        .with_catalog("1", sample_catalog())
        .with_datapackage("1", "1-XYZ0", "2021-10-01T00:00:00+00:00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connector_rejects_unknown_catalog() {
        let connector = sample_connector();
        assert!(connector.connect("1", &ForwardHeaders::none()).await.is_ok());
        let err = connector.connect("42", &ForwardHeaders::none()).await.err().unwrap();
        assert_eq!(err.status_code(), 404);
        assert_eq!(connector.open_catalogs().await, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_catalog_surfaces_upstream_status() {
        let catalog = FakeCatalog::new().failing(409, "conflict");
        let err = catalog.fetch_stats(&StatsQuery::new(dashboard_stats::CountVariable::Files)).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(catalog.stats_calls(), 1);
    }
}
