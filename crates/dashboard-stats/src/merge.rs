//! Collapse long tails of outer groups or inner cells into `"other"`.
//!
//! Every function here conserves the sum of all cells.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use dashboard_common::{DashboardError, Result};

use crate::model::{OuterGroup, OTHER_LABEL};

/// How the inner-cell cap is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Cap each outer group on its own; the union of labels may exceed the cap.
    #[default]
    Local,
    /// Rank labels across all groups and keep the same top labels everywhere.
    Global,
}

impl FromStr for MergePolicy {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(MergePolicy::Local),
            "global" => Ok(MergePolicy::Global),
            _ => Err(DashboardError::invalid("Illegal mergePolicy requested - must be one of local,global")),
        }
    }
}

/// Validate a cap from the request path.
pub fn parse_cap(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| DashboardError::invalid(format!("{} must be >= 0", name)))
}

/// Keep the `max_groups` largest groups and fold the rest into one `"other"`
/// group appended last. Output is ordered by descending total even when
/// nothing is merged.
pub fn merge_groups(mut groups: Vec<OuterGroup>, max_groups: usize) -> Vec<OuterGroup> {
    // stable: equal totals keep first-seen order
    groups.sort_by(|a, b| b.total().cmp(&a.total()));

    if groups.len() <= max_groups {
        return groups;
    }

    let rest = groups.split_off(max_groups);
    let dimension = rest[0].dimension.clone();
    let mut other = OuterGroup::new(dimension, OTHER_LABEL);
    for group in rest {
        for (inner, count) in group.cells {
            other.add(&inner, count);
        }
    }
    groups.push(other);
    groups
}

/// Per-group inner cap: keep each group's top `max_atts` cells, fold the
/// remainder into that group's `"other"` cell.
pub fn merge_within_groups_local(groups: Vec<OuterGroup>, max_atts: usize) -> Vec<OuterGroup> {
    groups.into_iter().map(|mut group| {
        let mut cells: Vec<(String, u64)> = std::mem::take(&mut group.cells).into_iter().collect();
        cells.sort_by(|a, b| b.1.cmp(&a.1));
        for (i, (inner, count)) in cells.into_iter().enumerate() {
            let label = if i >= max_atts { OTHER_LABEL } else { inner.as_str() };
            group.add(label, count);
        }
        group
    }).collect()
}

/// Global inner cap: rank labels by their sum across every group, keep the top
/// `max_atts` and rename the rest to `"other"` in every group.
pub fn merge_within_groups_global(groups: Vec<OuterGroup>, max_atts: usize) -> Vec<OuterGroup> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for group in &groups {
        for (inner, count) in &group.cells {
            *totals.entry(inner.as_str()).or_insert(0) += count;
        }
    }
    if totals.len() <= max_atts {
        return groups;
    }

    let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let keep: HashSet<String> = ranked.iter().take(max_atts).map(|(l, _)| l.to_string()).collect();

    groups.into_iter().map(|mut group| {
        let cells = std::mem::take(&mut group.cells);
        for (inner, count) in cells {
            let label = if keep.contains(&inner) { inner.as_str() } else { OTHER_LABEL };
            group.add(label, count);
        }
        group
    }).collect()
}

/// Inner cap first, then outer cap.
pub fn apply_caps(
    groups: Vec<OuterGroup>,
    max_groups: Option<usize>,
    max_atts: Option<usize>,
    policy: MergePolicy,
) -> Vec<OuterGroup> {
    let groups = match (max_atts, policy) {
        (Some(max), MergePolicy::Local) => merge_within_groups_local(groups, max),
        (Some(max), MergePolicy::Global) => merge_within_groups_global(groups, max),
        (None, _) => groups,
    };
    match max_groups {
        Some(max) => merge_groups(groups, max),
        None => groups,
    }
}
