use axum::Router;

use backend_application::AppState;

use crate::handlers::{item_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/items",
            axum::routing::post(item_handlers::ingest_items),
        )
        .route(
            "/v1/items/bulk",
            axum::routing::post(item_handlers::get_items),
        )
        .route(
            "/v1/items/:asset_id",
            axum::routing::get(item_handlers::get_item),
        )
        .route(
            "/v1/items/:asset_id/rank",
            axum::routing::get(item_handlers::get_rank),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
