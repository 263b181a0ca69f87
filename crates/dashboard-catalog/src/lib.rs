//! dashboard-catalog - ERMrest client for the CFDE catalog.
//!
//!   - `path`     - ERMrest URL paths for every query the dashboard issues
//!   - `client`   - one catalog's base URL and the shared HTTP client
//!   - `queries`  - stats, DCC and count sources backed by a catalog
//!   - `registry` - process-wide cache of opened catalogs

pub mod path;
pub mod client;
pub mod queries;
pub mod registry;

pub use client::CatalogClient;
pub use queries::CatalogSession;
pub use registry::{CatalogRegistry, CatalogSettings};
