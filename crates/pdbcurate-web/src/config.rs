//! Configuration loading for pdbcurate.
//! Reads pdbcurate.toml from the current directory or the path in the
//! PDBCURATE_CONFIG env var, then applies env var overrides.

use anyhow::Context;
use pdbcurate_common::Schema;
use pdbcurate_structure::thumbnail::RCSB_IMAGE_HOST;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "PDBCURATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "pdbcurate.toml";

pub const ENV_BACKEND_URL: &str = "PDBCURATE_BACKEND_URL";
pub const ENV_API_KEY: &str = "PDBCURATE_API_KEY";
pub const ENV_PASSWORD: &str = "PDBCURATE_PASSWORD";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub structure: StructureConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "127.0.0.1:3001".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "secret_opt")]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessConfig {
    /// Shared secret for the login gate. No secret disables the gate.
    #[serde(default, deserialize_with = "secret_opt")]
    pub password: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_preset")]
    pub preset: String,
    /// YAML or JSON schema descriptor; takes precedence over `preset`.
    pub descriptor: Option<PathBuf>,
    /// Override of the schema's table name.
    pub table: Option<String>,
}

fn default_preset() -> String { "usc_backup".to_string() }

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            descriptor: None,
            table: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StructureConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_thumbnail_host")]
    pub thumbnail_host: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_cache_dir() -> PathBuf { PathBuf::from(".cache/structures") }
fn default_thumbnail_host() -> String { RCSB_IMAGE_HOST.to_string() }

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            thumbnail_host: default_thumbnail_host(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn secret_opt<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}

impl Config {
    /// Load configuration. `path` wins over PDBCURATE_CONFIG, which wins over
    /// `pdbcurate.toml`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config = Self::from_toml(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            info!(path = %path.display(), "Loaded configuration");
            config
        } else {
            warn!(path = %path.display(), "Config file not found; using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override values from the environment. `lookup` is injected so tests
    /// don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.backend.url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.backend.api_key = Some(SecretString::from(key));
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.access.password = Some(SecretString::from(password));
        }
    }

    /// Resolve the dataset schema: descriptor file or preset, then the
    /// optional table override.
    pub fn schema(&self) -> anyhow::Result<Schema> {
        let mut schema = match &self.dataset.descriptor {
            Some(path) => Schema::load(path)
                .with_context(|| format!("loading dataset descriptor {}", path.display()))?,
            None => Schema::preset(&self.dataset.preset)?,
        };
        if let Some(table) = &self.dataset.table {
            schema.table = table.clone();
        }
        schema.validate()?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests;
