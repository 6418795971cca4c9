use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{DbConfig, RuntimeConfig, DEFAULT_RANK_CAP};

use crate::MEMORY_DATABASE;

const DEFAULT_CONFIG_PATH: &str = "./config.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub database_path: String,
    pub busy_timeout_ms: u64,
    pub store_timeout_ms: u64,
    pub rank_cap: usize,
    pub upsert_max_attempts: u32,
    pub upsert_backoff_base_ms: u64,
    pub bulk_max_items: usize,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3235".to_string(),
            api_token: None,
            database_path: "./data/items.db".to_string(),
            busy_timeout_ms: 5_000,
            store_timeout_ms: 10_000,
            rank_cap: DEFAULT_RANK_CAP,
            upsert_max_attempts: 3,
            upsert_backoff_base_ms: 50,
            bulk_max_items: 50,
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `WEARRANK_CONFIG`, or `./config.toml`, then applies
    /// `WEARRANK_*` overrides. A missing file falls back to defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let file_path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(
                env::var("WEARRANK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
            ),
        };
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(&file_path)
                .await
                .with_context(|| format!("failed to read {}", file_path.display()))?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", file_path.display());
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
        self.database_path = self.database_path.trim().to_string();
        self.upsert_max_attempts = self.upsert_max_attempts.max(1);
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if self.database_path != MEMORY_DATABASE {
            self.database_path = resolve_path(base, &self.database_path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.database_path.is_empty() {
            return Err(anyhow!("database_path must not be empty"));
        }
        if self.rank_cap == 0 {
            return Err(anyhow!("rank_cap must be greater than 0"));
        }
        if self.store_timeout_ms == 0 {
            return Err(anyhow!("store_timeout_ms must be greater than 0"));
        }
        if self.bulk_max_items == 0 {
            return Err(anyhow!("bulk_max_items must be greater than 0"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            store_timeout_ms: self.store_timeout_ms,
            rank_cap: self.rank_cap,
            upsert_max_attempts: self.upsert_max_attempts,
            upsert_backoff_base_ms: self.upsert_backoff_base_ms,
            bulk_max_items: self.bulk_max_items,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_path: self.database_path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("WEARRANK_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("WEARRANK_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("WEARRANK_DATABASE_PATH") {
            self.database_path = value;
        }
        if let Ok(value) = env::var("WEARRANK_BUSY_TIMEOUT_MS") {
            self.busy_timeout_ms = value.parse().unwrap_or(self.busy_timeout_ms);
        }
        if let Ok(value) = env::var("WEARRANK_STORE_TIMEOUT_MS") {
            self.store_timeout_ms = value.parse().unwrap_or(self.store_timeout_ms);
        }
        if let Ok(value) = env::var("WEARRANK_RANK_CAP") {
            self.rank_cap = value.parse().unwrap_or(self.rank_cap);
        }
        if let Ok(value) = env::var("WEARRANK_UPSERT_MAX_ATTEMPTS") {
            self.upsert_max_attempts = value.parse().unwrap_or(self.upsert_max_attempts);
        }
        if let Ok(value) = env::var("WEARRANK_UPSERT_BACKOFF_BASE_MS") {
            self.upsert_backoff_base_ms = value.parse().unwrap_or(self.upsert_backoff_base_ms);
        }
        if let Ok(value) = env::var("WEARRANK_BULK_MAX_ITEMS") {
            self.bulk_max_items = value.parse().unwrap_or(self.bulk_max_items);
        }
        if let Ok(value) = env::var("WEARRANK_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("WEARRANK_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.to_runtime_config().rank_cap, 1000);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut config = AppConfig::from_toml(
            r#"
bind_addr = "0.0.0.0:9000"
api_token = "   "
rank_cap = 250
"#,
        )
        .expect("parse toml");
        config.normalize();
        config.validate().expect("validate");
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.api_token, None);
        assert_eq!(config.rank_cap, 250);
        assert_eq!(config.store_timeout_ms, 10_000);
    }

    #[test]
    fn zero_rank_cap_is_rejected() {
        let config = AppConfig {
            rank_cap: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_database_path_follows_config_dir() {
        let mut config = AppConfig::default();
        config.resolve_paths(Some(Path::new("/etc/wearrank")));
        assert_eq!(config.database_path, "/etc/wearrank/./data/items.db");

        let mut config = AppConfig {
            database_path: MEMORY_DATABASE.to_string(),
            ..AppConfig::default()
        };
        config.resolve_paths(Some(Path::new("/etc/wearrank")));
        assert_eq!(config.database_path, MEMORY_DATABASE);
    }

    #[tokio::test]
    async fn explicit_path_is_loaded_and_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wearrank.toml");
        fs::write(&path, "rank_cap = 500\ndatabase_path = \"items.db\"\n")
            .await
            .expect("write config");

        let config = AppConfig::load(Some(path.as_path())).await.expect("load");
        assert_eq!(config.rank_cap, 500);
        assert_eq!(
            Path::new(&config.database_path),
            dir.path().join("items.db").as_path()
        );

        let missing = dir.path().join("absent.toml");
        let config = AppConfig::load(Some(missing.as_path())).await.expect("defaults");
        assert_eq!(config.rank_cap, DEFAULT_RANK_CAP);
    }
}
