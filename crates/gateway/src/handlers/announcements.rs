//! Announcement handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use validator::Validate;

use super::{validated, ApiJson};
use crate::AppState;
use portal_common::{dataset::Announcement, errors::Result};

#[derive(Debug, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 10000))]
    pub content: String,

    #[validate(length(max = 256))]
    pub author: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub status: &'static str,
    pub index: usize,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
    pub deleted: Announcement,
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<Announcement>> {
    Json(state.store.read().await.announcements().to_vec())
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnnouncementRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let request = validated(request)?;

    let index = state
        .store
        .post_announcement(Announcement {
            title: request.title.trim().to_string(),
            content: request.content,
            author: request.author,
            date: Some(Utc::now().to_rfc3339()),
            extra: Map::new(),
        })
        .await?;

    tracing::info!(index, "Announcement posted");
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            status: "success",
            index,
        }),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state.store.delete_announcement(index).await?;
    tracing::info!(index, "Announcement deleted");
    Ok(Json(DeletedResponse {
        status: "success",
        deleted,
    }))
}
