use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use backend_domain::ports::ItemRepository;
use backend_domain::services::RankEngine;
use backend_domain::RuntimeConfig;
use tokio::time::timeout;

use crate::{AppError, Metrics, RetryPolicy};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub item_repo: Arc<dyn ItemRepository>,
    pub rank_engine: RankEngine,
    pub retry_policy: RetryPolicy,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: RuntimeConfig, item_repo: Arc<dyn ItemRepository>) -> Self {
        let rank_engine = RankEngine::new(config.rank_cap);
        let retry_policy = RetryPolicy::new(
            config.upsert_max_attempts,
            Duration::from_millis(config.upsert_backoff_base_ms),
        );
        Self {
            config,
            item_repo,
            rank_engine,
            retry_policy,
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// Runs a store call under the configured timeout. Store writes are
    /// transactional, so a call abandoned here commits fully or not at all.
    pub async fn store_call<T, F>(&self, call: F) -> Result<T, AppError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let limit = Duration::from_millis(self.config.store_timeout_ms);
        match timeout(limit, call).await {
            Ok(result) => result.map_err(AppError::StorageUnavailable),
            Err(_) => Err(AppError::StorageUnavailable(anyhow!(
                "store call timed out after {}ms",
                self.config.store_timeout_ms
            ))),
        }
    }
}
