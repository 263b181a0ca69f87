//! One catalog on one DERIVA host.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::StatusCode;
use tracing::{debug, instrument};
use dashboard_common::{DashboardError, ForwardHeaders, Result};

use crate::path;

pub struct CatalogClient {
    catalog_id: String,
    base_url: String,
    http: reqwest::Client,
}

fn not_found_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"The requested catalog \S+ could not be found").expect("static pattern")
    })
}

/// Whether a failed connect check means the catalog does not exist.
pub fn is_missing_catalog(status: StatusCode, body: &str) -> bool {
    status == StatusCode::NOT_FOUND || not_found_pattern().is_match(body)
}

/// Turn an error status into `Upstream`, keeping the body as the message.
pub fn upstream_error(status: StatusCode, body: &str) -> DashboardError {
    let message = body.trim();
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("catalog request failed").to_string()
    } else {
        message.to_string()
    };
    DashboardError::upstream(Some(status.as_u16()), message)
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, host: &str, catalog_id: &str) -> Self {
        Self {
            catalog_id: catalog_id.to_string(),
            base_url: path::catalog_base(host, catalog_id),
            http,
        }
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, url: &str, headers: &ForwardHeaders) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url).header("accept", "application/json");
        for (name, value) in headers.pairs() {
            req = req.header(name, value);
        }
        req
    }

    /// Connect check: the catalog root must answer.
    #[instrument(skip(self, headers), fields(catalog = %self.catalog_id))]
    pub async fn probe(&self, headers: &ForwardHeaders) -> Result<()> {
        let url = format!("{}/", self.base_url);
        let resp = self.get(&url, headers).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        if is_missing_catalog(status, &body) {
            return Err(DashboardError::CatalogNotFound(self.catalog_id.clone()));
        }
        Err(upstream_error(status, &body))
    }

    /// GET an ERMrest path and return the JSON rows.
    #[instrument(skip(self, headers), fields(catalog = %self.catalog_id))]
    pub async fn fetch(&self, path: &str, headers: &ForwardHeaders) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self.get(&url, headers).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(upstream_error(status, &body));
        }
        let rows: Vec<serde_json::Value> = resp.json().await?;
        debug!(rows = rows.len(), "ERMrest query returned rows");
        Ok(rows)
    }
}
