//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use portal_common::dataset::{DatasetCounts, SourceOutcome};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub tables: DatasetCounts,
    /// Sources that were missing or unreadable at the last load
    pub degraded_sources: Vec<SourceOutcome>,
}

/// Plain-text banner
pub async fn index() -> &'static str {
    "Portal backend is running"
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: portal_common::VERSION,
    })
}

/// Readiness probe - reports table sizes and skipped sources
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let dataset = state.store.read().await;
    let degraded: Vec<SourceOutcome> = dataset.report().degraded().cloned().collect();

    Json(ReadyResponse {
        status: if degraded.is_empty() { "ready" } else { "degraded" }.to_string(),
        tables: dataset.counts(),
        degraded_sources: degraded,
    })
}
