// src/config/app.rs
//! Service configuration from `config/headlines.toml` (or `$HEADLINES_CONFIG_PATH`).
//!
//! TOML shape (every key optional):
//! ```toml
//! [server]
//! bind = "0.0.0.0:8000"
//! default_site = "bbc.com"
//! metrics = true
//!
//! [fetch]
//! timeout_secs = 10
//! max_retries = 2
//! backoff_ms = 500
//! user_agent = "headline-relay/0.1"
//! origins = { "bbc.com" = "http://localhost:9000/" }
//!
//! [queue]
//! workers = 4
//! capacity = 64
//! chain_deadline_secs = 60
//!
//! [classifier]
//! enabled = true
//! model_path = "models/opinion.json"
//!
//! [notify]
//! format = "blocks"   # or "plain"
//! timeout_secs = 5
//! max_retries = 2
//!
//! [store]
//! database_url = "sqlite://news.db"
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notify::NotifyFormat;
use crate::queue::QueueConfig;
use crate::sites::SiteRegistry;

pub const DEFAULT_CONFIG_PATH: &str = "config/headlines.toml";
pub const ENV_CONFIG_PATH: &str = "HEADLINES_CONFIG_PATH";
pub const ENV_BIND: &str = "HEADLINES_BIND";
pub const ENV_DEFAULT_SITE: &str = "HEADLINES_DEFAULT_SITE";
pub const ENV_MODEL_PATH: &str = "HEADLINES_MODEL_PATH";
pub const ENV_DATABASE_URL: &str = "HEADLINES_DATABASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub queue: QueueSection,
    pub classifier: ClassifierConfig,
    pub notify: NotifyConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub default_site: String,
    pub metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
            default_site: "bbc.com".into(),
            metrics: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_retries: u8,
    pub backoff_ms: u64,
    pub user_agent: String,
    /// Per-site origin overrides (staging mirrors, local fixtures).
    pub origins: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
            backoff_ms: 500,
            user_agent: concat!("headline-relay/", env!("CARGO_PKG_VERSION")).into(),
            origins: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueSection {
    pub workers: usize,
    pub capacity: usize,
    pub chain_deadline_secs: u64,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            workers: 4,
            capacity: 64,
            chain_deadline_secs: 60,
        }
    }
}

impl QueueSection {
    pub fn to_queue_config(&self) -> QueueConfig {
        QueueConfig {
            workers: self.workers,
            capacity: self.capacity,
            chain_deadline: Duration::from_secs(self.chain_deadline_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,
    pub model_path: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: PathBuf::from("models/opinion.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub format: NotifyFormat,
    pub timeout_secs: u64,
    pub max_retries: u8,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            format: NotifyFormat::Blocks,
            timeout_secs: 5,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persistence is off unless this is set.
    pub database_url: Option<String>,
}

impl AppConfig {
    /// Parse a TOML file, apply env overrides, validate.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        cfg.with_env_overrides().validated()
    }

    /// Resolution order:
    /// 1) $HEADLINES_CONFIG_PATH (must exist)
    /// 2) config/headlines.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        AppConfig::default().with_env_overrides().validated()
    }

    fn with_env_overrides(mut self) -> Self {
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        if let Some(v) = var(ENV_BIND) {
            self.server.bind = v;
        }
        if let Some(v) = var(ENV_DEFAULT_SITE) {
            self.server.default_site = v;
        }
        if let Some(v) = var(ENV_MODEL_PATH) {
            self.classifier.model_path = PathBuf::from(v);
        }
        if let Some(v) = var(ENV_DATABASE_URL) {
            self.store.database_url = Some(v);
        }
        self
    }

    fn validated(self) -> Result<Self> {
        let registry = SiteRegistry::builtin();
        if !registry.contains(&self.server.default_site) {
            bail!(
                "server.default_site {:?} must be one of {}",
                self.server.default_site,
                registry.supported().join(", ")
            );
        }
        if self.queue.workers == 0 {
            bail!("queue.workers must be at least 1");
        }
        if self.queue.capacity == 0 {
            bail!("queue.capacity must be at least 1");
        }
        for (site, origin) in &self.fetch.origins {
            if !registry.contains(site) {
                bail!("fetch.origins has unsupported site {site:?}");
            }
            url::Url::parse(origin)
                .with_context(|| format!("fetch.origins.{site} is not a valid URL"))?;
        }
        Ok(self)
    }
}
