//! Pivot flat stats rows into outer groups.
//!
//! Each row contributes its count to the cell `(dim1[, dim3]) → dim2`. Outer
//! groups come out in the order their key was first seen; nothing is sorted.

use std::collections::HashMap;

use tracing::warn;
use dashboard_common::{DashboardError, Result};

use crate::dcc::DccDirectory;
use crate::dimension::DimensionSpec;
use crate::model::{normalize_label, OuterGroup, StatsRow, UNKNOWN_LABEL};

/// Display label of one dimension for one row.
///
/// DCC-kind dimensions carry an internal identifier that is swapped for the
/// DCC abbreviation; an identifier the directory does not know maps to
/// `"unknown"` rather than leaking out.
pub fn row_label(row: &StatsRow, spec: &DimensionSpec, dccs: Option<&DccDirectory>) -> String {
    let raw = row.label(&spec.name);
    if !spec.is_dcc() {
        return normalize_label(raw);
    }
    match raw {
        None | Some("null") => UNKNOWN_LABEL.to_string(),
        Some(id) => match dccs.and_then(|d| d.abbreviation(id)) {
            Some(abbrev) => abbrev.to_string(),
            None => {
                warn!(dimension = %spec.name, id, "Unmapped DCC identifier in stats row");
                UNKNOWN_LABEL.to_string()
            }
        },
    }
}

pub fn pivot(
    rows: &[StatsRow],
    primary: &DimensionSpec,
    secondary: &DimensionSpec,
    count_attr: &str,
    tertiary: Option<&DimensionSpec>,
    dccs: Option<&DccDirectory>,
) -> Result<Vec<OuterGroup>> {
    if primary.name == secondary.name {
        return Err(DashboardError::invalid(
            "grouping1 and grouping2 cannot be the same dimension.",
        ));
    }

    let mut groups: Vec<OuterGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let dim1 = row_label(row, primary, dccs);
        let dim2 = row_label(row, secondary, dccs);
        let dim3 = tertiary.map(|t| {
            if t.name == secondary.name {
                dim2.clone()
            } else {
                row_label(row, t, dccs)
            }
        });

        let key = match &dim3 {
            Some(d3) => format!("{}:{}", dim1, d3),
            None => dim1.clone(),
        };

        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                let mut group = OuterGroup::new(primary.name.as_str(), dim1);
                if let (Some(t), Some(d3)) = (tertiary, dim3) {
                    group = group.with_tertiary(t.name.as_str(), d3);
                }
                groups.push(group);
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].add(&dim2, row.count(count_attr));
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcc::dcc_record;
    use crate::dimension::DccIdentity;
    use pretty_assertions::assert_eq;

    fn row(anatomy: Option<&str>, species: Option<&str>, n: Option<u64>) -> StatsRow {
        StatsRow::new()
            .with_label("anatomy", anatomy)
            .with_label("species", species)
            .with_count("num_files", n)
    }

    fn anatomy() -> DimensionSpec { DimensionSpec::vocabulary("anatomy") }
    fn species() -> DimensionSpec { DimensionSpec::vocabulary("species") }

    #[test]
    fn test_groups_in_first_seen_order() {
        let rows = vec![
            row(Some("liver"), Some("Homo sapiens"), Some(2)),
            row(Some("brain"), Some("Homo sapiens"), Some(50)),
            row(Some("liver"), Some("Mus musculus"), Some(3)),
        ];
        let groups = pivot(&rows, &anatomy(), &species(), "num_files", None, None).unwrap();
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["liver", "brain"]);
        assert_eq!(groups[0].get("Mus musculus"), Some(3));
        assert_eq!(groups[0].total(), 5);
    }

    #[test]
    fn test_null_labels_share_unknown_bucket() {
        let rows = vec![
            row(None, Some("Homo sapiens"), Some(1)),
            row(Some("null"), Some("Homo sapiens"), Some(4)),
            row(Some("brain"), None, None),
        ];
        let groups = pivot(&rows, &anatomy(), &species(), "num_files", None, None).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, UNKNOWN_LABEL);
        assert_eq!(groups[0].get("Homo sapiens"), Some(5));
        assert_eq!(groups[1].get(UNKNOWN_LABEL), Some(0));
    }

    #[test]
    fn test_same_dimension_rejected() {
        let err = pivot(&[], &anatomy(), &anatomy(), "num_files", None, None).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_pivot_conserves_counts() {
        let rows = vec![
            row(Some("a"), Some("x"), Some(7)),
            row(Some("b"), Some("y"), Some(11)),
            row(Some("a"), Some("y"), None),
            row(None, Some("x"), Some(5)),
        ];
        let groups = pivot(&rows, &anatomy(), &species(), "num_files", None, None).unwrap();
        let total: u64 = groups.iter().map(|g| g.total()).sum();
        assert_eq!(total, 23);
    }

    #[test]
    fn test_dcc_translated_and_unmapped_is_unknown() {
        let dccs = DccDirectory::build(
            &[dcc_record("cfde_registry_dcc:4dn", 3, "4DN", 30)],
            DccIdentity::ProjectNid,
        );
        let rows = vec![
            StatsRow::new().with_label("dcc", Some("30")).with_label("anatomy", Some("brain")).with_count("num_files", Some(9)),
            StatsRow::new().with_label("dcc", Some("99")).with_label("anatomy", Some("brain")).with_count("num_files", Some(1)),
        ];
        let groups = pivot(&rows, &DimensionSpec::dcc(), &anatomy(), "num_files", None, Some(&dccs)).unwrap();
        assert_eq!(groups[0].label, "4DN");
        assert_eq!(groups[1].label, UNKNOWN_LABEL);
        assert!(groups.iter().all(|g| g.label != "30" && g.label != "99"));
    }

    #[test]
    fn test_tertiary_splits_outer_groups() {
        let dccs = DccDirectory::build(
            &[dcc_record("a", 1, "HMP", 10), dcc_record("b", 2, "GTEx", 20)],
            DccIdentity::ProjectNid,
        );
        let rows = vec![
            row(Some("brain"), Some("Homo sapiens"), Some(1)).with_label("dcc", Some("10")),
            row(Some("brain"), Some("Homo sapiens"), Some(2)).with_label("dcc", Some("20")),
            row(Some("brain"), Some("Mus musculus"), Some(4)).with_label("dcc", Some("10")),
        ];
        let dcc = DimensionSpec::dcc();
        let groups = pivot(&rows, &anatomy(), &species(), "num_files", Some(&dcc), Some(&dccs)).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tertiary, Some(("dcc".to_string(), "HMP".to_string())));
        assert_eq!(groups[0].get("Mus musculus"), Some(4));
        assert_eq!(groups[1].tertiary, Some(("dcc".to_string(), "GTEx".to_string())));
        assert_eq!(groups[1].label, "brain");
    }

    #[test]
    fn test_tertiary_equal_to_secondary_reuses_label() {
        let dccs = DccDirectory::build(&[dcc_record("a", 1, "HMP", 10)], DccIdentity::ProjectNid);
        let rows = vec![
            StatsRow::new().with_label("anatomy", Some("brain")).with_label("dcc", Some("10")).with_count("num_files", Some(3)),
        ];
        let dcc = DimensionSpec::dcc();
        let groups = pivot(&rows, &anatomy(), &dcc, "num_files", Some(&dcc), Some(&dccs)).unwrap();
        assert_eq!(groups[0].tertiary, Some(("dcc".to_string(), "HMP".to_string())));
        assert_eq!(groups[0].get("HMP"), Some(3));
    }
}
