//! Admin handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use portal_common::{
    dashboard::{build_dashboard, Dashboard},
    dataset::{DatasetCounts, LoadReport},
};

#[derive(Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub tables: DatasetCounts,
    #[serde(flatten)]
    pub report: LoadReport,
}

pub async fn dashboard(State(state): State<AppState>) -> Json<Dashboard> {
    let dataset = state.store.read().await;
    Json(build_dashboard(&dataset, state.config.profile.dashboard_log_limit))
}

/// Rebuild every table from disk
pub async fn reload(State(state): State<AppState>) -> Json<ReloadResponse> {
    let report = state.store.reload().await;
    let tables = state.store.read().await.counts();

    Json(ReloadResponse {
        status: "success",
        tables,
        report,
    })
}
