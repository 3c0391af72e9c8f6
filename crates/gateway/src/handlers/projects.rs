//! Top-projects handler

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::AppState;
use portal_common::ranking::{top_projects, TopProject};

/// Upper bound for `?limit=`
pub const MAX_TOP_PROJECTS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct TopProjectsQuery {
    pub limit: Option<usize>,
}

pub async fn top(
    State(state): State<AppState>,
    Query(query): Query<TopProjectsQuery>,
) -> Json<Vec<TopProject>> {
    let limit = query
        .limit
        .unwrap_or(state.config.profile.top_projects_limit)
        .min(MAX_TOP_PROJECTS);

    let dataset = state.store.read().await;
    Json(top_projects(&dataset, limit))
}
