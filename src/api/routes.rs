use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Dataset snapshot
        .route(
            "/dataset",
            get(handlers::get_dataset).put(handlers::load_dataset),
        )
        // Group statistics
        .route("/aggregate", post(handlers::aggregate_facts))
        .route("/popularity", post(handlers::popularity))
        .route("/describe", post(handlers::describe_groups))
        .route("/share", post(handlers::share))
        .route("/crosstab", post(handlers::cross_tabulate))
        .route("/histogram", get(handlers::rating_histogram))
        // Co-occurrence
        .route("/items/:item_id/affinity", get(handlers::item_affinity))
}
