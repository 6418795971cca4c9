use tracing::{debug, warn};

use crate::{AppError, AppState};
use backend_domain::{current_millis, IngestSummary, Item, ItemObservation, StoredItem, UpsertOutcome};

/// Normalizes one observation and applies it to the store.
///
/// Observations without a usable wear come back as `Skipped` and never reach
/// the store.
pub async fn upsert_item(
    state: &AppState,
    observation: ItemObservation,
) -> Result<UpsertOutcome, AppError> {
    let asset_id = observation.asset_id;
    let Some(item) = Item::from_observation(observation, current_millis()) else {
        debug!(asset_id, "skipping observation without wear");
        state.metrics.record_upsert(UpsertOutcome::Skipped);
        return Ok(UpsertOutcome::Skipped);
    };

    let stored = StoredItem::from(&item);
    let decision = state
        .store_call(state.item_repo.upsert_item(&stored))
        .await
        .map_err(|err| {
            state.metrics.record_upsert_error();
            err
        })?;

    let outcome = UpsertOutcome::from(decision);
    state.metrics.record_upsert(outcome);
    debug!(asset_id, ?outcome, "applied observation");
    Ok(outcome)
}

/// Best-effort batch ingestion: each observation is retried under the
/// state's retry policy and a final failure is logged and counted instead of
/// failing the batch.
pub async fn ingest_items(state: &AppState, observations: Vec<ItemObservation>) -> IngestSummary {
    let mut summary = IngestSummary {
        received: observations.len(),
        ..IngestSummary::default()
    };
    for observation in observations {
        let asset_id = observation.asset_id;
        let result = state
            .retry_policy
            .run(|| upsert_item(state, observation.clone()))
            .await;
        match result {
            Ok(outcome) => summary.record(outcome),
            Err(err) => {
                summary.failed += 1;
                warn!(asset_id, "dropping observation after failed upsert: {}", err);
            }
        }
    }
    summary
}
