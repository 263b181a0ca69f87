//! dashboard-common - Shared error type and request plumbing used across all dashboard crates.

pub mod error;
pub mod headers;

// Re-export commonly used types
pub use error::{DashboardError, Result};
pub use headers::ForwardHeaders;
