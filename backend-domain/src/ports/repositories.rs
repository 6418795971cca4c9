use async_trait::async_trait;

use crate::entities::{RankClass, StoredItem};
use crate::services::{Decision, RankDirection};

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;

    /// Inserts `item`, supersedes the record under its canonical key, or
    /// leaves it alone, as one atomic write.
    async fn upsert_item(&self, item: &StoredItem) -> anyhow::Result<Decision>;

    async fn find_by_asset(&self, asset_id: i64) -> anyhow::Result<Option<StoredItem>>;

    /// Counts items of `class` strictly below or above `wear`, reading at
    /// most `cap` rows.
    async fn count_in_class(
        &self,
        class: &RankClass,
        wear: i32,
        direction: RankDirection,
        cap: usize,
    ) -> anyhow::Result<usize>;

    async fn ping(&self) -> anyhow::Result<()>;
}
