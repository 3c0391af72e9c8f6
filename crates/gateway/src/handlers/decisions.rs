//! Decision recording handler

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::{string_or_number, validated, ApiJson};
use crate::AppState;
use portal_common::{
    dataset::{Decision, DecisionStatus},
    errors::Result,
};

#[derive(Debug, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(length(min = 1, max = 256))]
    pub academician: String,

    #[serde(rename = "projId", deserialize_with = "string_or_number")]
    #[validate(length(min = 1, max = 64))]
    pub proj_id: String,

    pub decision: DecisionStatus,

    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,

    #[validate(length(max = 2000))]
    pub note: Option<String>,

    /// Any other client fields, stored alongside the decision
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize)]
pub struct DecisionResponse {
    pub status: &'static str,
    /// Whether an earlier decision for the same pair was overwritten
    pub updated: bool,
}

/// Upsert the decision for (academician, projId)
pub async fn record_decision(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DecisionRequest>,
) -> Result<Json<DecisionResponse>> {
    let request = validated(request)?;

    let mut decision = Decision::new(&request.academician, &request.proj_id, request.decision);
    decision.rating = request.rating;
    decision.note = request.note;
    decision.extra = request.extra;
    decision.updated_at = Some(Utc::now());

    let updated = state.store.record_decision(decision).await?;

    tracing::info!(
        academician = %request.academician,
        proj_id = %request.proj_id,
        decision = %request.decision,
        updated,
        "Decision recorded"
    );

    Ok(Json(DecisionResponse {
        status: "success",
        updated,
    }))
}
