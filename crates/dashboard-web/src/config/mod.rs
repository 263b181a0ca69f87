//! Configuration loading for the dashboard API.
//! Reads the file named by CFDE_DASHBOARD_CONFIG, else ./dashboard.toml,
//! else ~/dashboard.conf. With no file at all the defaults apply.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use dashboard_catalog::CatalogSettings;
use dashboard_stats::{DccIdentity, DimensionRegistry, DimensionSpec, MergePolicy};

pub const CONFIG_ENV: &str = "CFDE_DASHBOARD_CONFIG";
const LOCAL_FILE: &str = "dashboard.toml";
const HOME_FILE: &str = "dashboard.conf";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub deriva: DerivaConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

fn default_bind_addr() -> String { "127.0.0.1:5000".to_string() }
fn default_true()      -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_permissive: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivaConfig {
    #[serde(default = "default_servername")]
    pub servername: String,
    #[serde(default = "default_catalog_id")]
    pub default_catalog_id: String,
    #[serde(default = "default_registry_catalog_id")]
    pub registry_catalog_id: String,
    /// Forward the caller's Authorization and Cookie headers upstream.
    #[serde(default = "default_true")]
    pub pass_headers: bool,
    /// Local development only: a fixed webauthn token.
    #[serde(default)]
    pub dev_token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_servername()           -> String { "localhost".to_string() }
fn default_catalog_id()           -> String { "1".to_string() }
fn default_registry_catalog_id()  -> String { "registry".to_string() }
fn default_request_timeout_secs() -> u64 { 30 }

impl Default for DerivaConfig {
    fn default() -> Self {
        Self {
            servername: default_servername(),
            default_catalog_id: default_catalog_id(),
            registry_catalog_id: default_registry_catalog_id(),
            pass_headers: default_true(),
            dev_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub merge_policy: MergePolicy,
    #[serde(default)]
    pub dcc_identity: DccIdentity,
    /// Added to, or replacing by name, the built-in dimensions.
    #[serde(default)]
    pub dimensions: Vec<DimensionSpec>,
}

impl Config {
    /// Load configuration from the first file found, or defaults.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !Path::new(&path).exists() {
                anyhow::bail!("Config file not found: {} (from {})", path, CONFIG_ENV);
            }
            return Self::from_file(Path::new(&path));
        }
        match Self::locate() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::home_dir()
            .map(|home| home.join(HOME_FILE))
            .filter(|p| p.exists())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.deriva.default_catalog_id.trim().is_empty() {
            anyhow::bail!("deriva.default_catalog_id must not be empty");
        }
        Ok(config)
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            servername: self.deriva.servername.clone(),
            registry_catalog_id: self.deriva.registry_catalog_id.clone(),
            dev_token: self.deriva.dev_token.clone(),
            request_timeout: Duration::from_secs(self.deriva.request_timeout_secs),
        }
    }

    pub fn dimension_registry(&self) -> DimensionRegistry {
        DimensionRegistry::defaults()
            .with_overrides(self.stats.dimensions.clone())
            .with_dcc_identity(self.stats.dcc_identity)
    }
}

mod tests;
