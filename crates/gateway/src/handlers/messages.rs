//! Message handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use validator::Validate;

use super::{validated, ApiJson};
use crate::AppState;
use portal_common::{dataset::Message, errors::Result};

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub user: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MessageRequest {
    #[validate(length(min = 1, max = 256))]
    pub from: String,

    #[validate(length(min = 1, max = 256))]
    pub to: String,

    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

/// A message together with its position, the handle used for deletion
#[derive(Serialize)]
pub struct IndexedMessage {
    pub index: usize,
    #[serde(flatten)]
    pub message: Message,
}

#[derive(Serialize)]
pub struct SentResponse {
    pub status: &'static str,
    pub index: usize,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
    pub deleted: Message,
}

/// Messages sent to or by `?user=`; everything when absent
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Json<Vec<IndexedMessage>> {
    let user = query.user.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let dataset = state.store.read().await;

    Json(
        dataset
            .messages()
            .iter()
            .enumerate()
            .filter(|(_, m)| user.map_or(true, |u| m.involves(u)))
            .map(|(index, m)| IndexedMessage {
                index,
                message: m.clone(),
            })
            .collect(),
    )
}

pub async fn send(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MessageRequest>,
) -> Result<(StatusCode, Json<SentResponse>)> {
    let request = validated(request)?;

    let index = state
        .store
        .send_message(Message {
            from: request.from.trim().to_string(),
            to: request.to.trim().to_string(),
            content: request.content,
            timestamp: Some(Utc::now().to_rfc3339()),
            extra: Map::new(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SentResponse {
            status: "success",
            index,
        }),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state.store.delete_message(index).await?;
    Ok(Json(DeletedResponse {
        status: "success",
        deleted,
    }))
}
