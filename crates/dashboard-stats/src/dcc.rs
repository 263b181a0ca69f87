//! DCC records, the identifier → abbreviation directory, and the trait for
//! reading DCCs and their projects from the catalog.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use dashboard_common::{DashboardError, Result};

use crate::dimension::DccIdentity;

/// One row of `CFDE:dcc`, plus the alias `project_nid` for its root project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DccRecord {
    pub id: String,
    pub nid: i64,
    #[serde(rename = "RID", default)]
    pub rid: Option<String>,
    #[serde(rename = "dcc_name", default)]
    pub name: Option<String>,
    #[serde(rename = "dcc_abbreviation", default)]
    pub abbreviation: Option<String>,
    #[serde(rename = "dcc_description", default)]
    pub description: Option<String>,
    #[serde(rename = "dcc_url", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub project_nid: Option<i64>,
}

impl DccRecord {
    /// Public display label: abbreviation, falling back to the public id.
    pub fn display_label(&self) -> &str {
        self.abbreviation.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProjectRecord {
    /// Nothing on a project is non-nullable; take the first field present.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
            .or(self.abbreviation.as_deref())
            .or(self.description.as_deref())
            .or(self.id.as_deref())
    }
}

/// Prefetched raw DCC identifier → abbreviation lookup.
#[derive(Debug, Clone, Default)]
pub struct DccDirectory {
    by_key: HashMap<String, String>,
}

impl DccDirectory {
    pub fn build(dccs: &[DccRecord], identity: DccIdentity) -> Self {
        let by_key = dccs.iter()
            .filter_map(|d| identity.key_of(d).map(|k| (k, d.display_label().to_string())))
            .collect();
        Self { by_key }
    }

    pub fn abbreviation(&self, raw: &str) -> Option<&str> {
        self.by_key.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Read access to DCCs and the project tree.
#[async_trait]
pub trait DccSource: Send + Sync {
    async fn list_dccs(&self) -> Result<Vec<DccRecord>>;

    /// Look up one DCC by its public id.
    async fn find_dcc(&self, dcc_id: &str) -> Result<Option<DccRecord>> {
        Ok(self.list_dccs().await?.into_iter().find(|d| d.id == dcc_id))
    }

    /// Direct children of a project.
    async fn list_child_projects(&self, parent_project_nid: i64) -> Result<Vec<ProjectRecord>>;
}

/// Resolve a DCC id or fail with a not-found error.
pub async fn require_dcc<S: DccSource + ?Sized>(source: &S, dcc_id: &str) -> Result<DccRecord> {
    source.find_dcc(dcc_id).await?
        .ok_or_else(|| DashboardError::DccNotFound(dcc_id.to_string()))
}

// ── Mock Implementation for Testing ────────────────────────────────────────

#[derive(Default)]
pub struct MockDccSource {
    dccs: Vec<DccRecord>,
    children: HashMap<i64, Vec<ProjectRecord>>,
}

impl MockDccSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dcc: DccRecord) -> Self {
        self.dccs.push(dcc);
        self
    }

    pub fn with_child(mut self, parent_nid: i64, project: ProjectRecord) -> Self {
        self.children.entry(parent_nid).or_default().push(project);
        self
    }
}

#[async_trait]
impl DccSource for MockDccSource {
    async fn list_dccs(&self) -> Result<Vec<DccRecord>> {
        Ok(self.dccs.clone())
    }

    async fn list_child_projects(&self, parent_project_nid: i64) -> Result<Vec<ProjectRecord>> {
        Ok(self.children.get(&parent_project_nid).cloned().unwrap_or_default())
    }
}

/// Minimal record for tests and fixtures.
pub fn dcc_record(id: &str, nid: i64, abbreviation: &str, project_nid: i64) -> DccRecord {
    DccRecord {
        id: id.to_string(),
        nid,
        rid: Some(format!("1-{:04X}", nid)),
        name: Some(format!("{} consortium", abbreviation)),
        abbreviation: Some(abbreviation.to_string()),
        description: None,
        url: None,
        contact_name: None,
        contact_email: None,
        project_nid: Some(project_nid),
    }
}
