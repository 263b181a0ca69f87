//! ERMrest paths.
//!
//! Everything here is relative to the catalog base
//! (`{scheme}://{host}/ermrest/catalog/{id}`). Table and column names come from
//! dimension config and are used as-is; literal filter values are
//! percent-encoded.

use url::form_urlencoded;

use dashboard_stats::counts::{CountQuery, Scope};
use dashboard_stats::source::StatsQuery;

/// Schema holding every C2M2 table.
pub const SCHEMA: &str = "CFDE";

/// Columns selected from `CFDE:dcc`.
const DCC_COLUMNS: [&str; 9] = [
    "RID", "id", "nid", "dcc_name", "dcc_abbreviation", "dcc_description",
    "dcc_url", "contact_name", "contact_email",
];

pub fn scheme_for(host: &str) -> &'static str {
    if host == "localhost" { "http" } else { "https" }
}

pub fn catalog_base(host: &str, catalog_id: &str) -> String {
    format!("{}://{}/ermrest/catalog/{}", scheme_for(host), host, encode(catalog_id))
}

/// Percent-encode a literal for use in a path segment.
pub fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// All DCCs, or the one whose public id matches.
pub fn dcc_list(id: Option<&str>) -> String {
    let filter = id.map(|id| format!("/id={}", encode(id))).unwrap_or_default();
    format!(
        "attribute/D:=CFDE:dcc{}/{},project_nid:=project",
        filter,
        DCC_COLUMNS.join(",")
    )
}

/// Grouped aggregate over the counted entity.
///
/// Each dimension is left-joined so entities without a value still count,
/// grouped under a null label.
pub fn stats(query: &StatsQuery) -> String {
    let entity = query.variable.entity();
    let mut path = format!("attributegroup/M:={}:{}", SCHEMA, entity);
    let mut keys = Vec::with_capacity(query.dimensions.len());

    for (i, dim) in query.dimensions.iter().enumerate() {
        let alias = format!("D{}", i + 1);
        path.push_str(&format!(
            "/{alias}:=left({fk})=({schema}:{table}:{key})/$M",
            alias = alias,
            fk = dim.fk_column,
            schema = SCHEMA,
            table = dim.table,
            key = dim.key_column,
        ));
        keys.push(format!("{}:={}:{}", dim.name, alias, dim.label_column));
    }

    let count = format!(
        "{}:={}",
        query.variable.count_attr(),
        query.variable.aggregate_expr("M")
    );
    if keys.is_empty() {
        // attributegroup needs at least one key; fall back to a plain aggregate
        return format!("aggregate/M:={}:{}/{}", SCHEMA, entity, count);
    }
    format!("{}/{};{}", path, keys.join(","), count)
}

/// Root project `p`: every root in the catalog, or the DCC's own.
fn root_project(scope: &Scope) -> String {
    match scope.dcc_nid() {
        None => "p_root:=CFDE:project_root/p:=(project)=(CFDE:project:nid)".to_string(),
        Some(nid) => format!("dcc:=CFDE:dcc/nid={}/p:=(project)=(CFDE:project:nid)", nid),
    }
}

/// Root joined to its transitive members (the root is its own member).
fn project_members(scope: &Scope) -> String {
    format!(
        "{}/pipt:=(p:nid)=(CFDE:project_in_project_transitive:leader_project)",
        root_project(scope)
    )
}

fn top_level(scope: &Scope) -> String {
    format!("{}/pip:=(p:nid)=(CFDE:project_in_project:parent_project)", root_project(scope))
}

/// Core entities reachable through the member projects' core facts.
fn entity_path(scope: &Scope, alias: &str, table: &str) -> String {
    format!(
        "{}/cf:=(pipt:member_project)=(CFDE:core_fact:project)/{}:=(cf:nid)=(CFDE:{}:core_fact)",
        project_members(scope),
        alias,
        table
    )
}

fn linked(base: String, from: &str, link_alias: &str, link_table: &str, link_col: &str) -> String {
    format!("{}/{}:=({}:nid)=(CFDE:{}:{})", base, link_alias, from, link_table, link_col)
}

/// Aggregate path for one distinct count; the result row holds `n`.
pub fn count(scope: &Scope, query: CountQuery) -> String {
    let (path, target) = match query {
        CountQuery::ProjectMembers => (project_members(scope), "pipt:member_project"),
        CountQuery::TopLevelProjects => (top_level(scope), "pip:child_project"),
        CountQuery::Subjects => (entity_path(scope, "s", "subject"), "s:nid"),
        CountQuery::SubjectsWithBiosamples => (
            linked(entity_path(scope, "s", "subject"), "s", "bfs", "biosample_from_subject", "subject"),
            "s:nid",
        ),
        CountQuery::SubjectsWithFiles => (
            linked(entity_path(scope, "s", "subject"), "s", "fds", "file_describes_subject", "subject"),
            "s:nid",
        ),
        CountQuery::Biosamples => (entity_path(scope, "b", "biosample"), "b:nid"),
        CountQuery::BiosamplesWithSubjects => (
            linked(entity_path(scope, "b", "biosample"), "b", "bfs", "biosample_from_subject", "biosample"),
            "b:nid",
        ),
        CountQuery::BiosamplesWithFiles => (
            linked(entity_path(scope, "b", "biosample"), "b", "fdb", "file_describes_biosample", "biosample"),
            "b:nid",
        ),
        CountQuery::Files => (entity_path(scope, "f", "file"), "f:nid"),
        CountQuery::FilesWithSubjects => (
            linked(entity_path(scope, "f", "file"), "f", "fds", "file_describes_subject", "file"),
            "f:nid",
        ),
        CountQuery::FilesWithBiosamples => (
            linked(entity_path(scope, "f", "file"), "f", "fdb", "file_describes_biosample", "file"),
            "f:nid",
        ),
        CountQuery::VocabularyTerms(table) => {
            return format!("aggregate/{}:{}/n:=cnt(*)", SCHEMA, table);
        }
    };
    format!("aggregate/{}/n:=cnt_d({})", path, target)
}

pub fn child_projects(parent_project_nid: i64) -> String {
    format!(
        "attribute/PIP:=CFDE:project_in_project/parent_project={}\
         /C:=(child_project)=(CFDE:project:nid)/C:id,C:name,C:abbreviation,C:description",
        parent_project_nid
    )
}

/// Registry datapackage whose review summary points at `catalog_id`.
pub fn datapackage(catalog_id: &str) -> String {
    format!(
        "entity/CFDE:datapackage/review_summary_url::regexp::{}",
        encode(&format!("catalogId={}$", catalog_id))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_stats::dcc::dcc_record;
    use dashboard_stats::{CountVariable, DimensionRegistry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scheme_follows_host() {
        assert_eq!(catalog_base("localhost", "1"), "http://localhost/ermrest/catalog/1");
        assert_eq!(
            catalog_base("app.nih-cfde.org", "registry"),
            "https://app.nih-cfde.org/ermrest/catalog/registry"
        );
    }

    #[test]
    fn test_dcc_list_path() {
        assert_eq!(
            dcc_list(None),
            "attribute/D:=CFDE:dcc/RID,id,nid,dcc_name,dcc_abbreviation,dcc_description,\
             dcc_url,contact_name,contact_email,project_nid:=project"
        );
        assert!(dcc_list(Some("cfde_registry_dcc:hmp"))
            .starts_with("attribute/D:=CFDE:dcc/id=cfde_registry_dcc%3Ahmp/RID,"));
    }

    #[test]
    fn test_stats_path_two_dimensions() {
        let reg = DimensionRegistry::defaults();
        let q = StatsQuery::new(CountVariable::Files)
            .dimension(reg.query_dimension(reg.resolve("dcc").unwrap()))
            .dimension(reg.query_dimension(reg.resolve("assay").unwrap()));
        assert_eq!(
            stats(&q),
            "attributegroup/M:=CFDE:file\
             /D1:=left(dcc)=(CFDE:dcc:nid)/$M\
             /D2:=left(assay_type)=(CFDE:assay_type:nid)/$M\
             /dcc:=D1:project,assay_type:=D2:name;num_files:=cnt_d(M:nid)"
        );
    }

    #[test]
    fn test_stats_path_volume_sums_bytes() {
        let reg = DimensionRegistry::defaults();
        let q = StatsQuery::new(CountVariable::Volume)
            .dimension(reg.query_dimension(reg.resolve("gene").unwrap()));
        assert!(stats(&q).ends_with("/gene:=D1:id;num_bytes:=sum(M:size_in_bytes)"));
    }

    #[test]
    fn test_count_paths() {
        let dcc = Scope::Dcc(dcc_record("cfde_registry_dcc:hmp", 4, "HMP", 40));
        assert_eq!(
            count(&dcc, CountQuery::ProjectMembers),
            "aggregate/dcc:=CFDE:dcc/nid=4/p:=(project)=(CFDE:project:nid)\
             /pipt:=(p:nid)=(CFDE:project_in_project_transitive:leader_project)\
             /n:=cnt_d(pipt:member_project)"
        );
        assert_eq!(
            count(&Scope::Catalog, CountQuery::TopLevelProjects),
            "aggregate/p_root:=CFDE:project_root/p:=(project)=(CFDE:project:nid)\
             /pip:=(p:nid)=(CFDE:project_in_project:parent_project)\
             /n:=cnt_d(pip:child_project)"
        );
        let files_with_biosamples = count(&Scope::Catalog, CountQuery::FilesWithBiosamples);
        assert!(files_with_biosamples.contains("/f:=(cf:nid)=(CFDE:file:core_fact)"));
        assert!(files_with_biosamples.ends_with(
            "/fdb:=(f:nid)=(CFDE:file_describes_biosample:file)/n:=cnt_d(f:nid)"
        ));
    }

    #[test]
    fn test_vocabulary_count_ignores_scope() {
        let dcc = Scope::Dcc(dcc_record("x", 1, "X", 2));
        assert_eq!(
            count(&dcc, CountQuery::VocabularyTerms("anatomy")),
            "aggregate/CFDE:anatomy/n:=cnt(*)"
        );
    }

    #[test]
    fn test_datapackage_regexp_is_encoded() {
        assert_eq!(
            datapackage("3"),
            "entity/CFDE:datapackage/review_summary_url::regexp::catalogId%3D3%24"
        );
    }

    #[test]
    fn test_child_projects_path() {
        assert_eq!(
            child_projects(12),
            "attribute/PIP:=CFDE:project_in_project/parent_project=12\
             /C:=(child_project)=(CFDE:project:nid)/C:id,C:name,C:abbreviation,C:description"
        );
    }
}
