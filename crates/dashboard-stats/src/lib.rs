//! dashboard-stats - Grouped statistics for the CFDE dashboard.
//!
//! Turns flat count rows from the catalog into the nested structures the
//! dashboard charts consume:
//!   - `pivot`   - rows → ordered outer groups of inner label counts
//!   - `merge`   - collapse long tails into an "other" bucket
//!   - `counts`  - distinct entity counts for a DCC or the whole catalog
//!   - `service` - validated entry points used by the HTTP layer

pub mod model;
pub mod dimension;
pub mod dcc;
pub mod source;
pub mod pivot;
pub mod merge;
pub mod counts;
pub mod request;
pub mod service;

pub use model::{CountVariable, OuterGroup, StatsRow, OTHER_LABEL, UNKNOWN_LABEL};
pub use dimension::{DccIdentity, DimensionKind, DimensionRegistry, DimensionSpec, QueryDimension};
pub use dcc::{DccDirectory, DccRecord, DccSource, ProjectRecord};
pub use source::{Catalog, CatalogConnector, Datapackage, StatsQuery, StatsRowSource};
pub use merge::MergePolicy;
pub use counts::{CountKind, CountField, CountQuery, DistinctCountSource, EntityCountAggregator, EntityCounts, Scope};
pub use request::{DccStatsRequest, GroupedStatsParams, GroupedStatsRequest};
