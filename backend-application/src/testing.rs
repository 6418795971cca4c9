// In-process ItemRepository used by the command and query tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use backend_domain::services::dedup;
use backend_domain::{
    CanonicalKey, Decision, ItemRepository, RankClass, RankDirection, RuntimeConfig, StoredItem,
};
use tokio::sync::Mutex;

use crate::AppState;

#[derive(Default)]
pub struct FakeItemRepository {
    items: Mutex<BTreeMap<CanonicalKey, StoredItem>>,
    pub failing: AtomicBool,
    pub stall: AtomicBool,
    pub writes: AtomicUsize,
}

impl FakeItemRepository {
    async fn guard(&self) -> anyhow::Result<()> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}

#[async_trait]
impl ItemRepository for FakeItemRepository {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn upsert_item(&self, item: &StoredItem) -> anyhow::Result<Decision> {
        self.guard().await?;
        let mut items = self.items.lock().await;
        let resolution = dedup::resolve(item, items.get(&item.key()));
        let decision = resolution.decision();
        match resolution {
            dedup::Resolution::Create(record) | dedup::Resolution::Supersede(record) => {
                self.writes.fetch_add(1, Ordering::SeqCst);
                items.insert(record.key(), record);
            }
            dedup::Resolution::Ignore => {}
        }
        Ok(decision)
    }

    async fn find_by_asset(&self, asset_id: i64) -> anyhow::Result<Option<StoredItem>> {
        self.guard().await?;
        let items = self.items.lock().await;
        Ok(items.values().find(|item| item.asset_id == asset_id).cloned())
    }

    async fn count_in_class(
        &self,
        class: &RankClass,
        wear: i32,
        direction: RankDirection,
        cap: usize,
    ) -> anyhow::Result<usize> {
        self.guard().await?;
        let items = self.items.lock().await;
        Ok(items
            .values()
            .filter(|item| item.class() == *class)
            .filter(|item| match direction {
                RankDirection::Below => item.wear < wear,
                RankDirection::Above => item.wear > wear,
            })
            .take(cap)
            .count())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.guard().await
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        store_timeout_ms: 200,
        rank_cap: 1000,
        upsert_max_attempts: 2,
        upsert_backoff_base_ms: 1,
        bulk_max_items: 50,
        max_body_bytes: 1024,
        request_timeout_seconds: 5,
    }
}

pub fn test_state() -> (AppState, Arc<FakeItemRepository>) {
    let repo = Arc::new(FakeItemRepository::default());
    let state = AppState::new(runtime_config(), repo.clone());
    (state, repo)
}
