//! HTTP handlers, one module per resource.

pub mod dcc;
pub mod stats;
pub mod system;

use std::sync::{Arc, OnceLock};

use axum::http::{header, HeaderMap};
use regex::Regex;
use serde::Deserialize;
use dashboard_common::{DashboardError, ForwardHeaders, Result};
use dashboard_stats::{Catalog, CatalogConnector};

use crate::error::ApiResult;
use crate::state::AppState;

/// `?catalogId=` accepted by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    #[serde(rename = "catalogId")]
    pub catalog_id: Option<String>,
}

fn catalog_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+$").expect("static pattern"))
}

/// Requested catalog id, or the configured default when none was given.
pub fn resolve_catalog_id(state: &AppState, requested: Option<&str>) -> Result<String> {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        None => Ok(state.config.deriva.default_catalog_id.clone()),
        Some(id) if catalog_id_pattern().is_match(id) => Ok(id.to_string()),
        Some(id) => Err(DashboardError::invalid(format!(
            "catalogId must be a non-negative integer, got '{}'",
            id
        ))),
    }
}

/// Caller credentials to pass upstream, if forwarding is enabled.
pub fn forward_headers(state: &AppState, headers: &HeaderMap) -> ForwardHeaders {
    if !state.config.deriva.pass_headers {
        return ForwardHeaders::none();
    }
    let get = |name: header::HeaderName| {
        headers.get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    ForwardHeaders {
        authorization: get(header::AUTHORIZATION),
        cookie: get(header::COOKIE),
    }
}

/// One opened catalog for the request being served.
pub struct CatalogHandle {
    pub catalog_id: String,
    pub catalog: Arc<dyn Catalog>,
    pub headers: ForwardHeaders,
}

pub async fn open_catalog(
    state: &AppState,
    params: &CatalogParams,
    headers: &HeaderMap,
) -> ApiResult<CatalogHandle> {
    let catalog_id = resolve_catalog_id(state, params.catalog_id.as_deref())?;
    let headers = forward_headers(state, headers);
    let catalog = state.connector.connect(&catalog_id, &headers).await?;
    Ok(CatalogHandle { catalog_id, catalog, headers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use dashboard_test_utils::sample_connector;

    use crate::config::Config;

    fn state(config: Config) -> AppState {
        AppState::new(Arc::new(sample_connector()), config)
    }

    #[test]
    fn test_catalog_id_defaults_and_validation() {
        let state = state(Config::default());
        assert_eq!(resolve_catalog_id(&state, None).unwrap(), "1");
        assert_eq!(resolve_catalog_id(&state, Some("")).unwrap(), "1");
        assert_eq!(resolve_catalog_id(&state, Some("42")).unwrap(), "42");
        let err = resolve_catalog_id(&state, Some("1;drop")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(resolve_catalog_id(&state, Some("-3")).is_err());
    }

    #[test]
    fn test_forward_headers_respects_config() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("webauthn=xyz"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

        let forwarded = forward_headers(&state(Config::default()), &headers);
        assert_eq!(forwarded.cookie.as_deref(), Some("webauthn=xyz"));
        assert_eq!(forwarded.authorization.as_deref(), Some("Bearer t"));

        let mut config = Config::default();
        config.deriva.pass_headers = false;
        assert!(forward_headers(&state(config), &headers).is_empty());
    }
}
