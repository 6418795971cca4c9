// Canonical record upsert policy
//
// Every store adapter runs `resolve` and the resulting write inside one
// transaction; the policy itself holds no state.

use serde::Serialize;

use crate::entities::{StoredItem, UpsertOutcome};
use crate::value_objects::decode_u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Create,
    Supersede,
    Ignore,
}

impl From<Decision> for UpsertOutcome {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Create => UpsertOutcome::Created,
            Decision::Supersede => UpsertOutcome::Superseded,
            Decision::Ignore => UpsertOutcome::Ignored,
        }
    }
}

/// The decision together with the record to write, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Create(StoredItem),
    Supersede(StoredItem),
    Ignore,
}

impl Resolution {
    pub fn decision(&self) -> Decision {
        match self {
            Resolution::Create(_) => Decision::Create,
            Resolution::Supersede(_) => Decision::Supersede,
            Resolution::Ignore => Decision::Ignore,
        }
    }
}

/// Decides how `incoming` relates to the record already stored under the
/// same canonical key. Asset ids are compared as unsigned values; their
/// signed column form wraps above `i64::MAX`.
pub fn decide(incoming: &StoredItem, existing: Option<&StoredItem>) -> Decision {
    match existing {
        None => Decision::Create,
        Some(existing) if decode_u64(incoming.asset_id) > decode_u64(existing.asset_id) => {
            Decision::Supersede
        }
        Some(_) => Decision::Ignore,
    }
}

/// Applies [`decide`] and builds the record to persist.
///
/// A superseding record takes linkage, stickers and timestamp from
/// `incoming`; classification stays as first inserted.
pub fn resolve(incoming: &StoredItem, existing: Option<&StoredItem>) -> Resolution {
    match (decide(incoming, existing), existing) {
        (Decision::Create, _) => Resolution::Create(incoming.clone()),
        (Decision::Supersede, Some(existing)) => Resolution::Supersede(StoredItem {
            asset_id: incoming.asset_id,
            holder_id: incoming.holder_id,
            linked_id: incoming.linked_id,
            stickers: incoming.stickers.clone(),
            updated_at: incoming.updated_at,
            ..existing.clone()
        }),
        _ => Resolution::Ignore,
    }
}

/// True when two records under one canonical key disagree on classification.
pub fn classification_differs(existing: &StoredItem, incoming: &StoredItem) -> bool {
    existing.properties != incoming.properties
        || existing.stattrak != incoming.stattrak
        || existing.souvenir != incoming.souvenir
}
