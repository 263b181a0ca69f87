//! Boundary validation. Everything here runs before a single query is issued.

use dashboard_common::{DashboardError, Result};

use crate::dimension::{DimensionRegistry, DimensionSpec};
use crate::merge::{parse_cap, MergePolicy};
use crate::model::CountVariable;

/// Raw parameters of the two-dimension stats endpoints.
#[derive(Debug, Clone, Default)]
pub struct GroupedStatsParams {
    pub variable: String,
    pub grouping1: String,
    pub grouping2: String,
    pub max_groups1: Option<i64>,
    pub max_groups2: Option<i64>,
    pub include_dcc: bool,
    pub policy: MergePolicy,
}

#[derive(Debug, Clone)]
pub struct GroupedStatsRequest {
    pub variable: CountVariable,
    pub primary: DimensionSpec,
    pub secondary: DimensionSpec,
    pub tertiary: Option<DimensionSpec>,
    pub max_groups: Option<usize>,
    pub max_atts: Option<usize>,
    pub policy: MergePolicy,
}

impl GroupedStatsRequest {
    pub fn validate(registry: &DimensionRegistry, params: &GroupedStatsParams) -> Result<Self> {
        let variable: CountVariable = params.variable.parse()?;
        let primary = registry.grouping(&params.grouping1, true)?;
        let secondary = registry.grouping(&params.grouping2, true)?;
        // compare resolved names so `assay` and `assay_type` collide
        if primary.name == secondary.name {
            return Err(DashboardError::invalid(
                "grouping1 and grouping2 cannot be the same dimension.",
            ));
        }
        let max_groups = params.max_groups1.map(|v| parse_cap("maxgroups1", v)).transpose()?;
        let max_atts = params.max_groups2.map(|v| parse_cap("maxgroups2", v)).transpose()?;

        let tertiary = if params.include_dcc && !primary.is_dcc() {
            registry.dcc().cloned()
        } else {
            None
        };

        Ok(Self {
            variable,
            primary: primary.clone(),
            secondary: secondary.clone(),
            tertiary,
            max_groups,
            max_atts,
            policy: params.policy,
        })
    }
}

/// Single-dimension stats for one DCC; `dcc` itself is not a legal grouping.
#[derive(Debug, Clone)]
pub struct DccStatsRequest {
    pub variable: CountVariable,
    pub grouping: DimensionSpec,
}

impl DccStatsRequest {
    pub fn validate(registry: &DimensionRegistry, variable: &str, grouping: &str) -> Result<Self> {
        let variable: CountVariable = variable.parse()?;
        let grouping = registry.grouping(grouping, false)?.clone();
        Ok(Self { variable, grouping })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(v: &str, g1: &str, g2: &str) -> GroupedStatsParams {
        GroupedStatsParams {
            variable: v.into(),
            grouping1: g1.into(),
            grouping2: g2.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request() {
        let reg = DimensionRegistry::defaults();
        let req = GroupedStatsRequest::validate(&reg, &params("files", "dcc", "assay")).unwrap();
        assert_eq!(req.variable, CountVariable::Files);
        assert_eq!(req.secondary.name, "assay_type");
        assert!(req.tertiary.is_none());
    }

    #[test]
    fn test_alias_and_canonical_name_are_the_same_dimension() {
        let reg = DimensionRegistry::defaults();
        let err = GroupedStatsRequest::validate(&reg, &params("files", "assay", "assay_type")).unwrap_err();
        assert!(err.to_string().contains("cannot be the same"));
    }

    #[test]
    fn test_variable_checked_first() {
        let reg = DimensionRegistry::defaults();
        let err = GroupedStatsRequest::validate(&reg, &params("bytes", "foo", "foo")).unwrap_err();
        assert!(err.to_string().starts_with("Illegal variable/entity requested"));
    }

    #[test]
    fn test_negative_caps_rejected() {
        let reg = DimensionRegistry::defaults();
        let mut p = params("subjects", "anatomy", "species");
        p.max_groups2 = Some(-2);
        let err = GroupedStatsRequest::validate(&reg, &p).unwrap_err();
        assert_eq!(err.to_string(), "maxgroups2 must be >= 0");
    }

    #[test]
    fn test_include_dcc_only_when_primary_is_not_dcc() {
        let reg = DimensionRegistry::defaults();
        let mut p = params("files", "anatomy", "species");
        p.include_dcc = true;
        let req = GroupedStatsRequest::validate(&reg, &p).unwrap();
        assert_eq!(req.tertiary.map(|t| t.name), Some("dcc".to_string()));

        let mut p = params("files", "dcc", "species");
        p.include_dcc = true;
        let req = GroupedStatsRequest::validate(&reg, &p).unwrap();
        assert!(req.tertiary.is_none());
    }

    #[test]
    fn test_dcc_stats_rejects_dcc_grouping() {
        let reg = DimensionRegistry::defaults();
        assert!(DccStatsRequest::validate(&reg, "files", "anatomy").is_ok());
        let err = DccStatsRequest::validate(&reg, "files", "dcc").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
