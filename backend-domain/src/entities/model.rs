use serde::{Deserialize, Serialize};

use crate::entities::{Item, ItemObservation};

#[derive(Debug, Deserialize)]
pub struct IngestEnvelope {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub items: Vec<ItemObservation>,
}

/// Result of one upsert as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Superseded,
    Ignored,
    /// The observation carries no usable wear and was not stored.
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub received: usize,
    pub created: usize,
    pub superseded: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestSummary {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Superseded => self.superseded += 1,
            UpsertOutcome::Ignored => self.ignored += 1,
            UpsertOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Bounded wear rank. A missing side means the item sits beyond the scan cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rank {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    #[serde(flatten)]
    pub rank: Rank,
}

#[derive(Debug, Deserialize)]
pub struct BulkItemRequest {
    pub asset_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub store_timeout_ms: u64,
    pub rank_cap: usize,
    pub upsert_max_attempts: u32,
    pub upsert_backoff_base_ms: u64,
    pub bulk_max_items: usize,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: String,
    pub busy_timeout_ms: u64,
}
