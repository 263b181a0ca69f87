//! Distinct entity counts for one DCC or for the whole catalog.
//!
//! Every count is independently requestable. A requested count whose query
//! returns nothing comes back as zero, never as a missing key.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use dashboard_common::Result;

use crate::dcc::DccRecord;

/// Which slice of the catalog the counts cover.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Catalog,
    Dcc(DccRecord),
}

impl Scope {
    pub fn dcc_nid(&self) -> Option<i64> {
        match self {
            Scope::Catalog => None,
            Scope::Dcc(dcc) => Some(dcc.nid),
        }
    }
}

/// One distinct-count query against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountQuery {
    /// Transitive project members, the root included.
    ProjectMembers,
    /// Direct children of the root project.
    TopLevelProjects,
    Subjects,
    SubjectsWithBiosamples,
    SubjectsWithFiles,
    Biosamples,
    BiosamplesWithSubjects,
    BiosamplesWithFiles,
    Files,
    FilesWithSubjects,
    FilesWithBiosamples,
    /// Row count of a vocabulary table. Ignores scope.
    VocabularyTerms(&'static str),
}

/// Field names in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountField {
    ProjectCount,
    ToplevelProjectCount,
    SubjectCount,
    SubjectWithBiosampleCount,
    SubjectWithFileCount,
    BiosampleCount,
    BiosampleWithSubjectCount,
    BiosampleWithFileCount,
    FileCount,
    FileWithSubjectCount,
    FileWithBiosampleCount,
    AnatomyCount,
    AssayCount,
    DiseaseCount,
    GeneCount,
    CompoundCount,
}

/// Named flags a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountKind {
    Project,
    Subject,
    SubjectWithBiosample,
    SubjectWithFile,
    Biosample,
    BiosampleWithSubject,
    BiosampleWithFile,
    File,
    FileWithSubject,
    FileWithBiosample,
    Anatomy,
    AssayType,
    Disease,
    Gene,
    Compound,
}

impl CountKind {
    pub const ALL: [CountKind; 15] = [
        CountKind::Project,
        CountKind::Subject,
        CountKind::SubjectWithBiosample,
        CountKind::SubjectWithFile,
        CountKind::Biosample,
        CountKind::BiosampleWithSubject,
        CountKind::BiosampleWithFile,
        CountKind::File,
        CountKind::FileWithSubject,
        CountKind::FileWithBiosample,
        CountKind::Anatomy,
        CountKind::AssayType,
        CountKind::Disease,
        CountKind::Gene,
        CountKind::Compound,
    ];

    /// Project, subject, biosample and file counts plus the six link counts.
    pub const ENTITIES: [CountKind; 10] = [
        CountKind::Project,
        CountKind::Subject,
        CountKind::SubjectWithBiosample,
        CountKind::SubjectWithFile,
        CountKind::Biosample,
        CountKind::BiosampleWithSubject,
        CountKind::BiosampleWithFile,
        CountKind::File,
        CountKind::FileWithSubject,
        CountKind::FileWithBiosample,
    ];

    /// Output fields and the query behind each.
    fn queries(&self) -> &'static [(CountField, CountQuery)] {
        use CountField as F;
        use CountQuery as Q;
        match self {
            CountKind::Project => &[
                (F::ProjectCount, Q::ProjectMembers),
                (F::ToplevelProjectCount, Q::TopLevelProjects),
            ],
            CountKind::Subject              => &[(F::SubjectCount, Q::Subjects)],
            CountKind::SubjectWithBiosample => &[(F::SubjectWithBiosampleCount, Q::SubjectsWithBiosamples)],
            CountKind::SubjectWithFile      => &[(F::SubjectWithFileCount, Q::SubjectsWithFiles)],
            CountKind::Biosample            => &[(F::BiosampleCount, Q::Biosamples)],
            CountKind::BiosampleWithSubject => &[(F::BiosampleWithSubjectCount, Q::BiosamplesWithSubjects)],
            CountKind::BiosampleWithFile    => &[(F::BiosampleWithFileCount, Q::BiosamplesWithFiles)],
            CountKind::File                 => &[(F::FileCount, Q::Files)],
            CountKind::FileWithSubject      => &[(F::FileWithSubjectCount, Q::FilesWithSubjects)],
            CountKind::FileWithBiosample    => &[(F::FileWithBiosampleCount, Q::FilesWithBiosamples)],
            CountKind::Anatomy              => &[(F::AnatomyCount, Q::VocabularyTerms("anatomy"))],
            CountKind::AssayType            => &[(F::AssayCount, Q::VocabularyTerms("assay_type"))],
            CountKind::Disease              => &[(F::DiseaseCount, Q::VocabularyTerms("disease"))],
            CountKind::Gene                 => &[(F::GeneCount, Q::VocabularyTerms("gene"))],
            CountKind::Compound             => &[(F::CompoundCount, Q::VocabularyTerms("compound"))],
        }
    }
}

/// Runs one distinct-count query. `None` means the query returned no rows.
#[async_trait]
pub trait DistinctCountSource: Send + Sync {
    async fn distinct_count(&self, scope: &Scope, query: CountQuery) -> Result<Option<u64>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntityCounts(BTreeMap<CountField, u64>);

impl EntityCounts {
    pub fn get(&self, field: CountField) -> Option<u64> {
        self.0.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CountField, u64)> + '_ {
        self.0.iter().map(|(f, n)| (*f, *n))
    }
}

pub struct EntityCountAggregator<'a, S: DistinctCountSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: DistinctCountSource + ?Sized> EntityCountAggregator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Compute the requested counts; `None` requests every kind.
    pub async fn compute(&self, scope: &Scope, kinds: Option<&[CountKind]>) -> Result<EntityCounts> {
        let kinds = kinds.unwrap_or(&CountKind::ALL[..]);
        let mut out = BTreeMap::new();

        for kind in kinds {
            for (field, query) in kind.queries() {
                if out.contains_key(field) {
                    continue;
                }
                let n = self.source.distinct_count(scope, *query).await?.unwrap_or(0);
                // the root project is its own transitive member
                let n = match query {
                    CountQuery::ProjectMembers => n.saturating_sub(1),
                    _ => n,
                };
                out.insert(*field, n);
            }
        }

        debug!(scope = ?scope.dcc_nid(), fields = out.len(), "Computed entity counts");
        Ok(EntityCounts(out))
    }
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Canned counts per query; anything not set returns no rows.
#[derive(Default)]
pub struct MockCountSource {
    counts: std::collections::HashMap<CountQuery, u64>,
}

impl MockCountSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: CountQuery, n: u64) -> Self {
        self.counts.insert(query, n);
        self
    }
}

#[async_trait]
impl DistinctCountSource for MockCountSource {
    async fn distinct_count(&self, _scope: &Scope, query: CountQuery) -> Result<Option<u64>> {
        Ok(self.counts.get(&query).copied())
    }
}
