//! Process-wide registry of opened catalogs.
//!
//! Connections are opened lazily on first use and kept for the life of the
//! process. A failed connect is never cached: a missing catalog may be
//! created later.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use dashboard_common::{ForwardHeaders, Result};
use dashboard_stats::source::{Catalog, CatalogConnector, Datapackage};

use crate::client::CatalogClient;
use crate::path;
use crate::queries::CatalogSession;

/// Connection settings for the DERIVA host.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub servername: String,
    pub registry_catalog_id: String,
    /// Fixed webauthn token sent instead of the caller's credentials.
    pub dev_token: Option<String>,
    pub request_timeout: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            servername: "localhost".to_string(),
            registry_catalog_id: "registry".to_string(),
            dev_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct CatalogRegistry {
    settings: CatalogSettings,
    http: reqwest::Client,
    clients: RwLock<HashMap<String, Arc<CatalogClient>>>,
}

impl CatalogRegistry {
    pub fn new(settings: CatalogSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("cfde-dashboard-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            settings,
            http,
            clients: RwLock::new(HashMap::new()),
        })
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Credentials actually sent upstream.
    pub fn effective_headers(&self, inbound: &ForwardHeaders) -> ForwardHeaders {
        match &self.settings.dev_token {
            Some(token) => ForwardHeaders::dev_token(token),
            None => inbound.clone(),
        }
    }

    async fn client_for(&self, catalog_id: &str, headers: &ForwardHeaders) -> Result<Arc<CatalogClient>> {
        if let Some(client) = self.clients.read().await.get(catalog_id) {
            return Ok(client.clone());
        }

        let client = CatalogClient::new(self.http.clone(), &self.settings.servername, catalog_id);
        client.probe(headers).await?;

        let mut clients = self.clients.write().await;
        // another request may have opened it while we probed
        let client = clients
            .entry(catalog_id.to_string())
            .or_insert_with(|| Arc::new(client))
            .clone();
        info!(catalog = catalog_id, base = client.base_url(), "Opened catalog");
        Ok(client)
    }

    /// Drop every cached handle.
    pub async fn close(&self) {
        let mut clients = self.clients.write().await;
        let n = clients.len();
        clients.clear();
        info!(closed = n, "Closed catalog connections");
    }
}

#[async_trait]
impl CatalogConnector for CatalogRegistry {
    async fn connect(&self, catalog_id: &str, headers: &ForwardHeaders) -> Result<Arc<dyn Catalog>> {
        let headers = self.effective_headers(headers);
        let client = self.client_for(catalog_id, &headers).await?;
        let session: Arc<dyn Catalog> = Arc::new(CatalogSession::new(client, headers));
        Ok(session)
    }

    async fn find_datapackage(&self, catalog_id: &str, headers: &ForwardHeaders) -> Result<Option<Datapackage>> {
        let headers = self.effective_headers(headers);
        // the registry catalog is queried directly, not kept open
        let registry = CatalogClient::new(
            self.http.clone(),
            &self.settings.servername,
            &self.settings.registry_catalog_id,
        );
        let rows = registry.fetch(&path::datapackage(catalog_id), &headers).await?;
        debug!(catalog = catalog_id, matches = rows.len(), "Registry datapackage lookup");
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    async fn open_catalogs(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.clients.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_token_overrides_inbound_credentials() {
        let registry = CatalogRegistry::new(CatalogSettings {
            dev_token: Some("tok".into()),
            ..Default::default()
        }).unwrap();
        let inbound = ForwardHeaders {
            authorization: Some("Bearer user".into()),
            cookie: None,
        };
        assert_eq!(registry.effective_headers(&inbound), ForwardHeaders::dev_token("tok"));
    }

    #[test]
    fn test_inbound_credentials_pass_through() {
        let registry = CatalogRegistry::new(CatalogSettings::default()).unwrap();
        let inbound = ForwardHeaders {
            authorization: None,
            cookie: Some("webauthn=abc".into()),
        };
        assert_eq!(registry.effective_headers(&inbound), inbound);
    }

    #[tokio::test]
    async fn test_close_on_empty_registry() {
        let registry = CatalogRegistry::new(CatalogSettings::default()).unwrap();
        assert!(registry.open_catalogs().await.is_empty());
        registry.close().await;
        assert!(registry.open_catalogs().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_not_cached() {
        let registry = CatalogRegistry::new(CatalogSettings {
            servername: "127.0.0.1:9".into(),
            request_timeout: Duration::from_millis(500),
            ..Default::default()
        }).unwrap();
        let result = registry.connect("1", &ForwardHeaders::none()).await;
        assert!(result.is_err());
        assert!(registry.open_catalogs().await.is_empty());
    }
}
