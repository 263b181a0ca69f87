//! Request-scoped value types: count variables, flat stats rows and pivoted outer groups.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;
use dashboard_common::DashboardError;

/// Label used for a null/missing dimension value.
pub const UNKNOWN_LABEL: &str = "unknown";
/// Label of the synthetic bucket produced by merging.
pub const OTHER_LABEL: &str = "other";

/// Map a raw dimension value to the label used as a key.
/// `None` and the literal string `"null"` are the same thing to the dashboard.
pub fn normalize_label(raw: Option<&str>) -> String {
    match raw {
        None | Some("null") => UNKNOWN_LABEL.to_string(),
        Some(s) => s.to_string(),
    }
}

// ── Count variable ──────────────────────────────────────────────────────────

/// The quantity being summed. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountVariable {
    Files,
    Volume,
    Biosamples,
    Subjects,
    Collections,
}

impl CountVariable {
    pub const ALL: [CountVariable; 5] = [
        CountVariable::Files,
        CountVariable::Volume,
        CountVariable::Biosamples,
        CountVariable::Subjects,
        CountVariable::Collections,
    ];

    /// Names accepted on the wire, dashboard names first, entity names after.
    pub const LEGAL_NAMES: [&'static str; 9] = [
        "files", "volume", "samples", "subjects",
        "file", "biosample", "subject", "collection", "collections",
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "files" | "file"              => Some(CountVariable::Files),
            "volume"                      => Some(CountVariable::Volume),
            "samples" | "biosample"       => Some(CountVariable::Biosamples),
            "subjects" | "subject"        => Some(CountVariable::Subjects),
            "collection" | "collections"  => Some(CountVariable::Collections),
            _ => None,
        }
    }

    /// Catalog table holding the counted entity.
    pub fn entity(&self) -> &'static str {
        match self {
            CountVariable::Files | CountVariable::Volume => "file",
            CountVariable::Biosamples  => "biosample",
            CountVariable::Subjects    => "subject",
            CountVariable::Collections => "collection",
        }
    }

    /// Row attribute carrying the value.
    pub fn count_attr(&self) -> &'static str {
        match self {
            CountVariable::Files       => "num_files",
            CountVariable::Volume      => "num_bytes",
            CountVariable::Biosamples  => "num_biosamples",
            CountVariable::Subjects    => "num_subjects",
            CountVariable::Collections => "num_collections",
        }
    }

    /// ERMrest aggregate computing the value over the entity alias.
    pub fn aggregate_expr(&self, alias: &str) -> String {
        match self {
            CountVariable::Volume => format!("sum({}:size_in_bytes)", alias),
            _ => format!("cnt_d({}:nid)", alias),
        }
    }
}

impl fmt::Display for CountVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.count_attr())
    }
}

impl FromStr for CountVariable {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CountVariable::parse(s).ok_or_else(|| {
            DashboardError::invalid(format!(
                "Illegal variable/entity requested - must be one of {}",
                CountVariable::LEGAL_NAMES.join(",")
            ))
        })
    }
}

// ── Stats row ───────────────────────────────────────────────────────────────

/// One flat record from a stats query: a raw label per requested dimension
/// and one or more count attributes. Absent means null for both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsRow {
    labels: BTreeMap<String, Option<String>>,
    counts: BTreeMap<String, Option<u64>>,
}

impl StatsRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, dimension: &str, label: Option<&str>) -> Self {
        self.set_label(dimension, label.map(str::to_string));
        self
    }

    pub fn with_count(mut self, attr: &str, count: Option<u64>) -> Self {
        self.set_count(attr, count);
        self
    }

    pub fn set_label(&mut self, dimension: &str, label: Option<String>) {
        self.labels.insert(dimension.to_string(), label);
    }

    pub fn set_count(&mut self, attr: &str, count: Option<u64>) {
        self.counts.insert(attr.to_string(), count);
    }

    /// Raw label, `None` when null or not present.
    pub fn label(&self, dimension: &str) -> Option<&str> {
        self.labels.get(dimension).and_then(|l| l.as_deref())
    }

    /// Count for `attr`, null and absent both read as zero.
    pub fn count(&self, attr: &str) -> u64 {
        self.counts.get(attr).copied().flatten().unwrap_or(0)
    }
}

// ── Outer group ─────────────────────────────────────────────────────────────

/// One pivoted group: the primary-dimension label (reserved field), an
/// optional tertiary label, and the inner label → count cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterGroup {
    pub dimension: String,
    pub label: String,
    pub tertiary: Option<(String, String)>,
    pub cells: BTreeMap<String, u64>,
}

impl OuterGroup {
    pub fn new(dimension: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            label: label.into(),
            tertiary: None,
            cells: BTreeMap::new(),
        }
    }

    pub fn with_tertiary(mut self, dimension: impl Into<String>, label: impl Into<String>) -> Self {
        self.tertiary = Some((dimension.into(), label.into()));
        self
    }

    pub fn with_cell(mut self, inner: &str, count: u64) -> Self {
        self.add(inner, count);
        self
    }

    pub fn add(&mut self, inner: &str, count: u64) {
        *self.cells.entry(inner.to_string()).or_insert(0) += count;
    }

    pub fn get(&self, inner: &str) -> Option<u64> {
        self.cells.get(inner).copied()
    }

    /// Sum of the numeric cells; reserved fields never count.
    pub fn total(&self) -> u64 {
        self.cells.values().sum()
    }

    pub fn is_other(&self) -> bool {
        self.label == OTHER_LABEL
    }

    /// Cells keyed as they go on the wire. An inner label equal to a reserved
    /// key is renamed to `"<label> (value)"` so its count is kept.
    fn wire_cells(&self) -> BTreeMap<String, u64> {
        let tertiary_dim = self.tertiary.as_ref().map(|(dim, _)| dim.as_str());
        let mut out = BTreeMap::new();
        for (inner, count) in &self.cells {
            let key = if inner == &self.dimension || Some(inner.as_str()) == tertiary_dim {
                warn!(group = %self.label, label = %inner, "Inner label collides with a dimension key, renaming");
                format!("{} (value)", inner)
            } else {
                inner.clone()
            };
            *out.entry(key).or_insert(0) += count;
        }
        out
    }
}

/// Flat wire shape expected by the dashboard:
/// `{"anatomy": "brain", "dcc": "4DN", "Homo sapiens": 12, ...}`
impl Serialize for OuterGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let cells = self.wire_cells();

        let reserved = 1 + usize::from(self.tertiary.is_some());
        let mut map = serializer.serialize_map(Some(reserved + cells.len()))?;
        map.serialize_entry(&self.dimension, &self.label)?;
        if let Some((dim, label)) = &self.tertiary {
            map.serialize_entry(dim, label)?;
        }
        for (inner, count) in &cells {
            map.serialize_entry(inner, count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_literal_null_share_a_label() {
        assert_eq!(normalize_label(None), UNKNOWN_LABEL);
        assert_eq!(normalize_label(Some("null")), UNKNOWN_LABEL);
        assert_eq!(normalize_label(Some("brain")), "brain");
    }

    #[test]
    fn test_variable_aliases() {
        assert_eq!(CountVariable::parse("samples"), Some(CountVariable::Biosamples));
        assert_eq!(CountVariable::parse("biosample"), Some(CountVariable::Biosamples));
        assert_eq!(CountVariable::Volume.count_attr(), "num_bytes");
        assert_eq!(CountVariable::Volume.entity(), "file");
        assert!(CountVariable::parse("bytes").is_none());
    }

    #[test]
    fn test_unknown_variable_lists_legal_values() {
        let err = "bytes".parse::<CountVariable>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Illegal variable/entity requested"));
        assert!(msg.contains("files,volume,samples,subjects"));
    }

    #[test]
    fn test_row_null_count_reads_zero() {
        let row = StatsRow::new().with_count("num_files", None);
        assert_eq!(row.count("num_files"), 0);
        assert_eq!(row.count("num_bytes"), 0);
    }

    #[test]
    fn test_outer_group_serializes_flat() {
        let group = OuterGroup::new("anatomy", "brain")
            .with_tertiary("dcc", "4DN")
            .with_cell("Homo sapiens", 12)
            .with_cell("Mus musculus", 3);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["anatomy"], "brain");
        assert_eq!(json["dcc"], "4DN");
        assert_eq!(json["Homo sapiens"], 12);
        assert_eq!(group.total(), 15);
    }

    #[test]
    fn test_colliding_inner_label_is_renamed_not_dropped() {
        let group = OuterGroup::new("anatomy", "brain")
            .with_tertiary("dcc", "4DN")
            .with_cell("anatomy", 7)
            .with_cell("dcc", 2)
            .with_cell("x", 1);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json, serde_json::json!({
            "anatomy": "brain",
            "dcc": "4DN",
            "anatomy (value)": 7,
            "dcc (value)": 2,
            "x": 1,
        }));

        let wire_total: u64 = json.as_object().unwrap()
            .values()
            .filter_map(|v| v.as_u64())
            .sum();
        assert_eq!(wire_total, group.total());
    }
}
