//! dashboard-web - HTTP facade over the CFDE catalog.
//! Serves the dashboard UI:
//!   - DCC listings, detail and per-DCC counts
//!   - Two-dimension grouped statistics with optional "other" bucketing
//!   - Whole-catalog summary and health

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
