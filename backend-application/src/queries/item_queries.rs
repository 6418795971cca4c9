use std::collections::HashSet;

use tracing::error;

use crate::{AppError, AppState};
use backend_domain::{encode_u64, parse_u64, ItemView, Rank, StoredItem};

pub fn parse_asset_id(text: &str) -> Result<u64, AppError> {
    parse_u64(text).map_err(|err| AppError::InvalidInput(err.to_string()))
}

/// Returns the decoded item with its bounded rank.
pub async fn get_item(state: &AppState, asset_id: u64) -> Result<ItemView, AppError> {
    state.metrics.record_item_query();
    let stored = find_stored(state, asset_id).await?;
    let rank = rank_of(state, &stored).await?;
    Ok(ItemView {
        item: stored.decode(),
        rank,
    })
}

pub async fn get_rank(state: &AppState, asset_id: u64) -> Result<Rank, AppError> {
    state.metrics.record_rank_query();
    let stored = find_stored(state, asset_id).await?;
    rank_of(state, &stored).await
}

/// Looks up several assets at once. Unknown ids are left out of the result;
/// the first storage failure aborts the batch.
pub async fn get_items(state: &AppState, asset_ids: &[u64]) -> Result<Vec<ItemView>, AppError> {
    if asset_ids.len() > state.config.bulk_max_items {
        return Err(AppError::InvalidInput(format!(
            "at most {} asset ids per request",
            state.config.bulk_max_items
        )));
    }
    let mut seen = HashSet::new();
    let mut views = Vec::new();
    for &asset_id in asset_ids {
        if !seen.insert(asset_id) {
            continue;
        }
        match get_item(state, asset_id).await {
            Ok(view) => views.push(view),
            Err(AppError::NotFound) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(views)
}

async fn find_stored(state: &AppState, asset_id: u64) -> Result<StoredItem, AppError> {
    let found = state
        .store_call(state.item_repo.find_by_asset(encode_u64(asset_id)))
        .await
        .map_err(|err| {
            error!(asset_id, "failed to fetch item: {}", err);
            state.metrics.record_query_error();
            err
        })?;
    found.ok_or(AppError::NotFound)
}

async fn rank_of(state: &AppState, stored: &StoredItem) -> Result<Rank, AppError> {
    state
        .store_call(state.rank_engine.rank(state.item_repo.as_ref(), stored))
        .await
        .map_err(|err| {
            error!("failed to rank item: {}", err);
            state.metrics.record_query_error();
            err
        })
}
