//! HTTP API handlers.

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::comics::{collect_comics, Comic, ComicClient, ComicRange};
use crate::error::ApiError;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Metadata source client.
    pub client: ComicClient,
    /// Prometheus handle; `None` disables `/metrics`.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(client: ComicClient) -> Self {
        Self {
            client,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    /// Always "pong".
    pub message: &'static str,
}

/// Comics response.
#[derive(Debug, Serialize)]
pub struct ComicsResponse {
    /// Odd-month comics sorted by title.
    pub comics: Vec<Comic>,
}

/// Health check handler - always returns 200.
pub async fn ping() -> impl IntoResponse {
    Json(PingResponse { message: "pong" })
}

/// `GET /comics?start=N&end=M`.
pub async fn comics(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ComicsResponse>, ApiError> {
    let range = ComicRange::from_query(query.as_deref().unwrap_or_default())?;
    let comics = collect_comics(&state.client, range).await?;

    Ok(Json(ComicsResponse { comics }))
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
