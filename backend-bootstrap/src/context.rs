use std::sync::Arc;

use anyhow::Result;

use backend_application::AppState;
use backend_domain::ItemRepository;
use backend_infrastructure::{AppConfig, SqliteItemRepository};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    /// Opens the store named by `config` and wires it into the application
    /// state. The store handle lives as long as the returned context.
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let repo = Arc::new(SqliteItemRepository::open(&config.to_db_config())?);
        repo.ensure_schema().await?;

        let state = AppState::new(config.to_runtime_config(), repo);
        Ok(Self { state })
    }
}
