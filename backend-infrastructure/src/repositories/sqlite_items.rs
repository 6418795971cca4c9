use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info, warn};

use backend_domain::services::dedup::{self, Resolution};
use backend_domain::{
    decode_u64, CanonicalKey, DbConfig, Decision, ItemRepository, RankClass, RankDirection,
    Sticker, StoredItem,
};

pub const MEMORY_DATABASE: &str = ":memory:";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    asset_id INTEGER NOT NULL,
    holder_id INTEGER NOT NULL,
    linked_id INTEGER NOT NULL,
    defindex INTEGER NOT NULL,
    paintindex INTEGER NOT NULL,
    paint_seed INTEGER NOT NULL,
    wear INTEGER NOT NULL,
    stattrak INTEGER NOT NULL,
    souvenir INTEGER NOT NULL,
    properties INTEGER NOT NULL,
    rarity INTEGER NOT NULL,
    stickers TEXT,
    updated_at INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS items_canonical_key
    ON items (defindex, paintindex, wear, paint_seed);
CREATE UNIQUE INDEX IF NOT EXISTS items_asset_id ON items (asset_id);
CREATE INDEX IF NOT EXISTS items_rank_scan
    ON items (defindex, paintindex, stattrak, souvenir, wear);
"#;

const ITEM_COLUMNS: &str = "asset_id, holder_id, linked_id, defindex, paintindex, paint_seed, \
     wear, stattrak, souvenir, properties, rarity, stickers, updated_at";

const COUNT_BELOW: &str = "SELECT COUNT(*) FROM (\
     SELECT 1 FROM items \
     WHERE defindex = ?1 AND paintindex = ?2 AND stattrak = ?3 AND souvenir = ?4 AND wear < ?5 \
     ORDER BY wear ASC LIMIT ?6)";

const COUNT_ABOVE: &str = "SELECT COUNT(*) FROM (\
     SELECT 1 FROM items \
     WHERE defindex = ?1 AND paintindex = ?2 AND stattrak = ?3 AND souvenir = ?4 AND wear > ?5 \
     ORDER BY wear DESC LIMIT ?6)";

/// Item store on SQLite. One connection serialized behind a mutex; every
/// call runs on the blocking pool.
#[derive(Clone)]
pub struct SqliteItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteItemRepository {
    pub fn open(config: &DbConfig) -> Result<Self> {
        let conn = if config.database_path == MEMORY_DATABASE {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(&config.database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(&config.database_path)
                .with_context(|| format!("failed to open database {}", config.database_path))?
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        info!("opened item database at {}", config.database_path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            work(&mut guard)
        })
        .await?
    }
}

#[async_trait]
impl ItemRepository for SqliteItemRepository {
    async fn ensure_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
    }

    async fn upsert_item(&self, item: &StoredItem) -> Result<Decision> {
        let item = item.clone();
        self.with_conn(move |conn| upsert_in_transaction(conn, &item))
            .await
    }

    async fn find_by_asset(&self, asset_id: i64) -> Result<Option<StoredItem>> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM items WHERE asset_id = ?1", ITEM_COLUMNS);
            let mut stmt = conn.prepare_cached(&sql)?;
            let item = stmt.query_row(params![asset_id], read_item).optional()?;
            Ok(item)
        })
        .await
    }

    async fn count_in_class(
        &self,
        class: &RankClass,
        wear: i32,
        direction: RankDirection,
        cap: usize,
    ) -> Result<usize> {
        let class = *class;
        let limit = i64::try_from(cap).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let sql = match direction {
                RankDirection::Below => COUNT_BELOW,
                RankDirection::Above => COUNT_ABOVE,
            };
            let mut stmt = conn.prepare_cached(sql)?;
            let count: i64 = stmt.query_row(
                params![
                    class.defindex,
                    class.paintindex,
                    class.stattrak,
                    class.souvenir,
                    wear,
                    limit
                ],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            let _: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(())
        })
        .await
    }
}

/// Reads the record under the canonical key, applies the dedup policy and
/// writes the result inside one IMMEDIATE transaction, so concurrent writers
/// to the same key are serialized by the database.
fn upsert_in_transaction(conn: &mut Connection, item: &StoredItem) -> Result<Decision> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let existing = select_by_key(&tx, &item.key())?;
    if let Some(existing) = &existing {
        if dedup::classification_differs(existing, item) {
            debug!(
                defindex = item.defindex,
                paintindex = item.paintindex,
                paint_seed = item.paint_seed,
                "observation disagrees with stored classification; keeping stored values"
            );
        }
    }

    let mut resolution = dedup::resolve(item, existing.as_ref());
    if let Resolution::Create(record) | Resolution::Supersede(record) = &resolution {
        if asset_held_elsewhere(&tx, record.asset_id, &record.key())? {
            warn!(
                asset_id = decode_u64(record.asset_id),
                "asset id already stored under another canonical key; ignoring observation"
            );
            resolution = Resolution::Ignore;
        }
    }
    let decision = resolution.decision();
    match resolution {
        Resolution::Create(record) => insert_item(&tx, &record)?,
        Resolution::Supersede(record) => update_linkage(&tx, &record)?,
        Resolution::Ignore => {}
    }
    tx.commit()?;
    Ok(decision)
}

fn select_by_key(conn: &Connection, key: &CanonicalKey) -> Result<Option<StoredItem>> {
    let sql = format!(
        "SELECT {} FROM items \
         WHERE defindex = ?1 AND paintindex = ?2 AND wear = ?3 AND paint_seed = ?4",
        ITEM_COLUMNS
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let item = stmt
        .query_row(
            params![key.defindex, key.paintindex, key.wear, key.paint_seed],
            read_item,
        )
        .optional()?;
    Ok(item)
}

/// True when `asset_id` belongs to a record outside `key`.
fn asset_held_elsewhere(conn: &Connection, asset_id: i64, key: &CanonicalKey) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM items WHERE asset_id = ?1 \
         AND NOT (defindex = ?2 AND paintindex = ?3 AND wear = ?4 AND paint_seed = ?5)",
    )?;
    let held = stmt.exists(params![
        asset_id,
        key.defindex,
        key.paintindex,
        key.wear,
        key.paint_seed
    ])?;
    Ok(held)
}

fn insert_item(conn: &Connection, item: &StoredItem) -> Result<()> {
    let sql = format!(
        "INSERT INTO items ({}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        ITEM_COLUMNS
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.execute(params![
        item.asset_id,
        item.holder_id,
        item.linked_id,
        item.defindex,
        item.paintindex,
        item.paint_seed,
        item.wear,
        item.stattrak,
        item.souvenir,
        item.properties,
        item.rarity,
        encode_stickers(item.stickers.as_deref())?,
        item.updated_at,
    ])?;
    Ok(())
}

fn update_linkage(conn: &Connection, item: &StoredItem) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "UPDATE items \
         SET asset_id = ?1, holder_id = ?2, linked_id = ?3, stickers = ?4, updated_at = ?5 \
         WHERE defindex = ?6 AND paintindex = ?7 AND wear = ?8 AND paint_seed = ?9",
    )?;
    stmt.execute(params![
        item.asset_id,
        item.holder_id,
        item.linked_id,
        encode_stickers(item.stickers.as_deref())?,
        item.updated_at,
        item.defindex,
        item.paintindex,
        item.wear,
        item.paint_seed,
    ])?;
    Ok(())
}

fn encode_stickers(stickers: Option<&[Sticker]>) -> Result<Option<String>> {
    stickers
        .map(|stickers| serde_json::to_string(stickers))
        .transpose()
        .context("failed to encode stickers")
}

fn read_item(row: &Row<'_>) -> rusqlite::Result<StoredItem> {
    let stickers: Option<String> = row.get(11)?;
    let stickers = stickers
        .map(|text| serde_json::from_str::<Vec<Sticker>>(&text))
        .transpose()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(err)))?;
    Ok(StoredItem {
        asset_id: row.get(0)?,
        holder_id: row.get(1)?,
        linked_id: row.get(2)?,
        defindex: row.get(3)?,
        paintindex: row.get(4)?,
        paint_seed: row.get(5)?,
        wear: row.get(6)?,
        stattrak: row.get(7)?,
        souvenir: row.get(8)?,
        properties: row.get(9)?,
        rarity: row.get(10)?,
        stickers,
        updated_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::{encode_u64, encode_wear, Properties};

    async fn open_memory() -> SqliteItemRepository {
        let repo = SqliteItemRepository::open(&DbConfig {
            database_path: MEMORY_DATABASE.to_string(),
            busy_timeout_ms: 1_000,
        })
        .expect("open database");
        repo.ensure_schema().await.expect("schema");
        repo
    }

    fn item(asset_id: u64, wear: f32, paint_seed: u16) -> StoredItem {
        StoredItem {
            asset_id: encode_u64(asset_id),
            holder_id: encode_u64(76_561_198_084_749_846),
            linked_id: encode_u64(7_341_935_462_133_497_410),
            defindex: 7,
            paintindex: 282,
            paint_seed,
            wear: encode_wear(wear),
            stattrak: false,
            souvenir: false,
            properties: Properties {
                origin: 8,
                quality: 4,
                rarity: 5,
            }
            .pack(),
            rarity: 5,
            stickers: None,
            updated_at: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn first_observation_is_created_and_found() {
        let repo = open_memory().await;
        let mut stored = item(100, 0.25, 661);
        stored.stickers = Some(vec![Sticker {
            slot: 0,
            sticker_id: 76,
            wear: Some(0.5),
            duplicates: Some(2),
        }]);
        assert_eq!(repo.upsert_item(&stored).await.expect("upsert"), Decision::Create);
        let found = repo
            .find_by_asset(encode_u64(100))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn supersede_keeps_classification() {
        let repo = open_memory().await;
        repo.upsert_item(&item(100, 0.25, 661)).await.expect("upsert");

        let mut older = item(50, 0.25, 661);
        older.holder_id = encode_u64(1);
        assert_eq!(repo.upsert_item(&older).await.expect("upsert"), Decision::Ignore);
        assert!(repo.find_by_asset(encode_u64(50)).await.expect("find").is_none());

        let mut newer = item(150, 0.25, 661);
        newer.holder_id = encode_u64(4_286_390_140_613_453_317);
        newer.linked_id = encode_u64(42);
        newer.rarity = 6;
        newer.properties = Properties {
            origin: 1,
            quality: 4,
            rarity: 6,
        }
        .pack();
        newer.updated_at = 1_700_000_000_500;
        assert_eq!(repo.upsert_item(&newer).await.expect("upsert"), Decision::Supersede);

        assert!(repo.find_by_asset(encode_u64(100)).await.expect("find").is_none());
        let found = repo
            .find_by_asset(encode_u64(150))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.holder_id, newer.holder_id);
        assert_eq!(found.linked_id, 42);
        assert_eq!(found.updated_at, 1_700_000_000_500);
        assert_eq!(found.rarity, 5);
        assert_eq!(Properties::unpack(found.properties).origin, 8);
    }

    #[tokio::test]
    async fn asset_ids_above_signed_range_supersede() {
        let repo = open_memory().await;
        repo.upsert_item(&item(i64::MAX as u64, 0.25, 661))
            .await
            .expect("upsert");
        let decision = repo
            .upsert_item(&item(u64::MAX - 5, 0.25, 661))
            .await
            .expect("upsert");
        assert_eq!(decision, Decision::Supersede);
        let found = repo
            .find_by_asset(encode_u64(u64::MAX - 5))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(decode_u64(found.asset_id), u64::MAX - 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_observations_converge_on_largest_asset() {
        let repo = open_memory().await;
        let mut handles = Vec::new();
        for asset_id in [17_u64, 3, 42, 8, 41, 1, 29, 40, 12, 33] {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.upsert_item(&item(asset_id, 0.25, 661)).await
            }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await.expect("join").expect("upsert") == Decision::Create {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert!(repo.find_by_asset(encode_u64(42)).await.expect("find").is_some());
        let class = item(42, 0.25, 661).class();
        let total = repo
            .count_in_class(&class, encode_wear(0.0), RankDirection::Above, 100)
            .await
            .expect("count");
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn counts_respect_class_and_direction() {
        let repo = open_memory().await;
        for (i, wear) in [0.1_f32, 0.2, 0.3, 0.4, 0.5].into_iter().enumerate() {
            repo.upsert_item(&item(100 + i as u64, wear, 1))
                .await
                .expect("upsert");
        }
        let mut stattrak = item(200, 0.05, 1);
        stattrak.stattrak = true;
        repo.upsert_item(&stattrak).await.expect("upsert");

        let class = item(0, 0.3, 1).class();
        let wear = encode_wear(0.3);
        let below = repo
            .count_in_class(&class, wear, RankDirection::Below, 1000)
            .await
            .expect("count");
        let above = repo
            .count_in_class(&class, wear, RankDirection::Above, 1000)
            .await
            .expect("count");
        assert_eq!((below, above), (2, 2));
        let capped = repo
            .count_in_class(&class, wear, RankDirection::Below, 1)
            .await
            .expect("count");
        assert_eq!(capped, 1);
    }

    #[tokio::test]
    async fn persisted_records_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DbConfig {
            database_path: dir
                .path()
                .join("data")
                .join("items.db")
                .to_string_lossy()
                .to_string(),
            busy_timeout_ms: 1_000,
        };
        {
            let repo = SqliteItemRepository::open(&config).expect("open");
            repo.ensure_schema().await.expect("schema");
            repo.upsert_item(&item(100, 0.25, 661)).await.expect("upsert");
        }
        let repo = SqliteItemRepository::open(&config).expect("reopen");
        repo.ensure_schema().await.expect("schema");
        repo.ping().await.expect("ping");
        assert!(repo.find_by_asset(encode_u64(100)).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn asset_id_stays_with_its_first_canonical_key() {
        let repo = open_memory().await;
        repo.upsert_item(&item(100, 0.25, 661)).await.expect("upsert");
        repo.upsert_item(&item(50, 0.3, 661)).await.expect("upsert");

        let moved = repo
            .upsert_item(&item(100, 0.4, 661))
            .await
            .expect("upsert");
        assert_eq!(moved, Decision::Ignore);

        let superseding = repo
            .upsert_item(&item(100, 0.3, 661))
            .await
            .expect("upsert");
        assert_eq!(superseding, Decision::Ignore);

        let found = repo
            .find_by_asset(encode_u64(100))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.wear, encode_wear(0.25));
        assert!(repo.find_by_asset(encode_u64(50)).await.expect("find").is_some());
        let class = item(0, 0.25, 661).class();
        let total = repo
            .count_in_class(&class, 0, RankDirection::Above, 100)
            .await
            .expect("count");
        assert_eq!(total, 2);
    }
}
