//! Collaborator network handler

use axum::{extract::State, Json};

use super::{ApiJson, NameRequest};
use crate::AppState;
use portal_common::{
    errors::Result,
    network::{collaboration_graph, CollaborationGraph},
};

pub async fn network(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NameRequest>,
) -> Result<Json<CollaborationGraph>> {
    let name = request.required()?;
    let dataset = state.store.read().await;
    Ok(Json(collaboration_graph(&dataset, &name)?))
}
