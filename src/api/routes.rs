//! HTTP API route definitions.

use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers::{comics, metrics, ping, AppState};
use super::middleware::{log_requests, track_metrics};

/// Create the API router.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let mut router = Router::new()
        // Health endpoint
        .route("/ping", get(ping))
        .route("/comics", get(comics));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(metrics));
    }

    router
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}
