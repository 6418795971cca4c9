use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::{error, info};

use backend_application::commands::item_commands;
use backend_application::queries::item_queries;
use backend_application::{AppError, AppState};
use backend_domain::{BulkItemRequest, IngestSummary, ItemView, Rank};

use crate::error::HttpError;
use crate::middleware::{authorize, parse_observations};

pub async fn ingest_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<IngestSummary>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let max_bytes = state.config.max_body_bytes;
    let observations = parse_observations(&headers, &body, max_bytes).map_err(|err| {
        error!("failed to parse ingest body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    if observations.is_empty() {
        return Ok((StatusCode::OK, Json(IngestSummary::default())));
    }

    let summary = item_commands::ingest_items(&state, observations).await;
    if summary.failed > 0 || summary.skipped > 0 {
        info!(
            received = summary.received,
            skipped = summary.skipped,
            failed = summary.failed,
            "ingested batch with dropped observations"
        );
    }
    Ok((StatusCode::OK, Json(summary)))
}

pub async fn get_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(asset_id): Path<String>,
) -> Result<Json<ItemView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let asset_id = item_queries::parse_asset_id(&asset_id)?;
    let view = item_queries::get_item(&state, asset_id).await?;
    Ok(Json(view))
}

pub async fn get_items(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BulkItemRequest>,
) -> Result<Json<Vec<ItemView>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let asset_ids = payload
        .asset_ids
        .iter()
        .map(|id| item_queries::parse_asset_id(id))
        .collect::<Result<Vec<_>, _>>()?;
    let views = item_queries::get_items(&state, &asset_ids).await?;
    Ok(Json(views))
}

/// Unknown assets answer with an empty rank rather than 404.
pub async fn get_rank(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(asset_id): Path<String>,
) -> Result<Json<Rank>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let asset_id = item_queries::parse_asset_id(&asset_id)?;
    match item_queries::get_rank(&state, asset_id).await {
        Ok(rank) => Ok(Json(rank)),
        Err(AppError::NotFound) => Ok(Json(Rank::default())),
        Err(err) => Err(err.into()),
    }
}
