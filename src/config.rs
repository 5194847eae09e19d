//! Application configuration
//!
//! Persisted as JSON in the data directory. Backend credentials can be
//! overridden from the environment so they never have to be written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};
use crate::repository::DEFAULT_POLL_INTERVAL;

pub const CONFIG_FILE: &str = "shaadi_cart_config.json";
pub const DB_FILE: &str = "shaadi_cart.db";
pub const DEFAULT_BUCKET: &str = "shopping-images";

pub const ENV_URL: &str = "SHAADI_CART_URL";
pub const ENV_ANON_KEY: &str = "SHAADI_CART_ANON_KEY";

/// Hosted backend credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    #[serde(default = "default_bucket")]
    pub storage_bucket: String,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Local SQLite backend when absent
    #[serde(default)]
    pub backend: Option<BackendConfig>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl AppConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            backend: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Load the config in `data_dir`, or defaults when there is none yet
    pub fn load(data_dir: &Path) -> DomainResult<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| DomainError::Internal(format!("reading {}: {}", path.display(), e)))?;
            serde_json::from_str::<AppConfig>(&content)
                .map_err(|e| DomainError::InvalidInput(format!("{}: {}", path.display(), e)))?
        } else {
            AppConfig::new(data_dir.to_path_buf())
        };
        // Follow the directory the file was found in
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    /// `load` plus environment overrides
    pub fn from_env(data_dir: &Path) -> DomainResult<Self> {
        let mut config = Self::load(data_dir)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> DomainResult<()> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| DomainError::Internal(format!("creating {}: {}", self.data_dir.display(), e)))?;
        let json = serde_json::to_string_pretty(self).map_err(|e| DomainError::Internal(e.to_string()))?;
        let path = self.config_path();
        std::fs::write(&path, json)
            .map_err(|e| DomainError::Internal(format!("writing {}: {}", path.display(), e)))?;
        log::info!("saved config to {}", path.display());
        Ok(())
    }

    /// Apply `SHAADI_CART_URL` / `SHAADI_CART_ANON_KEY`. Both must be set to
    /// introduce a backend; either one alone patches an existing one.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let url = lookup(ENV_URL).filter(|v| !v.trim().is_empty());
        let key = lookup(ENV_ANON_KEY).filter(|v| !v.trim().is_empty());
        if let Some(backend) = self.backend.as_mut() {
            if let Some(url) = url {
                backend.url = url;
            }
            if let Some(anon_key) = key {
                backend.anon_key = anon_key;
            }
        } else if let (Some(url), Some(anon_key)) = (url, key) {
            self.backend = Some(BackendConfig {
                url,
                anon_key,
                storage_bucket: default_bucket(),
            });
        }
    }

    /// Point the app at a hosted backend (or back at the local one with None)
    pub fn configure_backend(&mut self, backend: Option<BackendConfig>) -> DomainResult<()> {
        if let Some(b) = &backend {
            if !(b.url.starts_with("https://") || b.url.starts_with("http://")) {
                return Err(DomainError::InvalidInput(format!("backend url must be http(s): {}", b.url)));
            }
            if b.anon_key.trim().is_empty() {
                return Err(DomainError::InvalidInput("anon key is required".to_string()));
            }
        }
        self.backend = backend;
        self.save()
    }
}
