//! Grouping dimensions.
//!
//! The set of legal groupings is data, not code: each dimension names the
//! vocabulary table it joins and the columns used for the join and the label.
//! Defaults cover the C2M2 vocabularies; config may override or add entries.

use serde::{Deserialize, Serialize};
use dashboard_common::{DashboardError, Result};

use crate::dcc::DccRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    #[default]
    Vocabulary,
    /// Owning organization. Raw values are internal keys and must be
    /// translated to an abbreviation before use as a label.
    Dcc,
}

/// Which DCC column identifies a DCC in stats rows.
///
/// The catalog schema has moved from RID-based to nid-based to
/// dcc-table-based keys; picking the column here keeps that out of the
/// pivot code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DccIdentity {
    Nid,
    #[default]
    ProjectNid,
    Rid,
}

impl DccIdentity {
    /// Column on the `dcc` table selected as the raw identifier.
    pub fn column(&self) -> &'static str {
        match self {
            DccIdentity::Nid        => "nid",
            DccIdentity::ProjectNid => "project",
            DccIdentity::Rid        => "RID",
        }
    }

    pub fn key_of(&self, dcc: &DccRecord) -> Option<String> {
        match self {
            DccIdentity::Nid        => Some(dcc.nid.to_string()),
            DccIdentity::ProjectNid => dcc.project_nid.map(|n| n.to_string()),
            DccIdentity::Rid        => dcc.rid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Table joined from the counted entity.
    pub table: String,
    /// Foreign-key column on the counted entity; defaults to `name`.
    #[serde(default)]
    pub fk_column: Option<String>,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default)]
    pub kind: DimensionKind,
}

fn default_label_column() -> String { "name".to_string() }

impl DimensionSpec {
    pub fn vocabulary(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            table: name.to_string(),
            fk_column: None,
            label_column: default_label_column(),
            kind: DimensionKind::Vocabulary,
        }
    }

    pub fn dcc() -> Self {
        Self {
            kind: DimensionKind::Dcc,
            ..Self::vocabulary("dcc")
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn labelled_by(mut self, column: &str) -> Self {
        self.label_column = column.to_string();
        self
    }

    pub fn fk_column(&self) -> &str {
        self.fk_column.as_deref().unwrap_or(&self.name)
    }

    pub fn is_dcc(&self) -> bool {
        self.kind == DimensionKind::Dcc
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

/// Dimension as sent to the stats source: everything resolved to columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDimension {
    pub name: String,
    pub table: String,
    pub fk_column: String,
    pub key_column: String,
    pub label_column: String,
}

#[derive(Debug, Clone)]
pub struct DimensionRegistry {
    specs: Vec<DimensionSpec>,
    dcc_identity: DccIdentity,
}

impl Default for DimensionRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

impl DimensionRegistry {
    pub fn new(specs: Vec<DimensionSpec>, dcc_identity: DccIdentity) -> Self {
        Self { specs, dcc_identity }
    }

    /// The C2M2 dimensions the dashboard ships with.
    pub fn defaults() -> Self {
        let specs = vec![
            DimensionSpec::dcc(),
            DimensionSpec::vocabulary("analysis_type"),
            DimensionSpec::vocabulary("anatomy"),
            DimensionSpec::vocabulary("assay_type").alias("assay"),
            DimensionSpec::vocabulary("compression_format"),
            DimensionSpec::vocabulary("data_type"),
            DimensionSpec::vocabulary("disease"),
            DimensionSpec::vocabulary("ethnicity"),
            DimensionSpec::vocabulary("file_format"),
            DimensionSpec::vocabulary("gene").labelled_by("id"),
            DimensionSpec::vocabulary("mime_type").labelled_by("id"),
            DimensionSpec::vocabulary("ncbi_taxonomy"),
            DimensionSpec::vocabulary("phenotype"),
            DimensionSpec::vocabulary("protein"),
            DimensionSpec::vocabulary("race"),
            DimensionSpec::vocabulary("sample_prep_method"),
            DimensionSpec::vocabulary("sex"),
            DimensionSpec::vocabulary("species"),
            DimensionSpec::vocabulary("substance"),
            DimensionSpec::vocabulary("subject_granularity"),
            DimensionSpec::vocabulary("subject_role"),
        ];
        Self::new(specs, DccIdentity::default())
    }

    /// Replace specs with the same name, append the rest.
    pub fn with_overrides(mut self, overrides: Vec<DimensionSpec>) -> Self {
        for spec in overrides {
            match self.specs.iter_mut().find(|s| s.name == spec.name) {
                Some(existing) => *existing = spec,
                None => self.specs.push(spec),
            }
        }
        self
    }

    pub fn with_dcc_identity(mut self, identity: DccIdentity) -> Self {
        self.dcc_identity = identity;
        self
    }

    pub fn dcc_identity(&self) -> DccIdentity {
        self.dcc_identity
    }

    pub fn resolve(&self, name: &str) -> Option<&DimensionSpec> {
        self.specs.iter().find(|s| s.answers_to(name))
    }

    pub fn dcc(&self) -> Option<&DimensionSpec> {
        self.specs.iter().find(|s| s.is_dcc())
    }

    /// Legal grouping names, optionally leaving out DCC-kind dimensions.
    pub fn names(&self, allow_dcc: bool) -> Vec<&str> {
        self.specs.iter()
            .filter(|s| allow_dcc || !s.is_dcc())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Look up a grouping named on the wire.
    pub fn grouping(&self, name: &str, allow_dcc: bool) -> Result<&DimensionSpec> {
        match self.resolve(name) {
            Some(spec) if allow_dcc || !spec.is_dcc() => Ok(spec),
            _ => Err(DashboardError::invalid(format!(
                "Illegal grouping requested - must be one of {}",
                self.names(allow_dcc).join(",")
            ))),
        }
    }

    pub fn query_dimension(&self, spec: &DimensionSpec) -> QueryDimension {
        let label_column = if spec.is_dcc() {
            self.dcc_identity.column().to_string()
        } else {
            spec.label_column.clone()
        };
        QueryDimension {
            name: spec.name.clone(),
            table: spec.table.clone(),
            fk_column: spec.fk_column().to_string(),
            key_column: "nid".to_string(),
            label_column,
        }
    }
}
