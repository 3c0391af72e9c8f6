//! Profile handler

use axum::{extract::State, Json};

use super::{ApiJson, NameRequest};
use crate::AppState;
use portal_common::{
    errors::Result,
    profile::{resolve_profile, ProfileOptions, ProfileView},
};

/// Profile card and ranked project matches for `{name}`
pub async fn profile(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NameRequest>,
) -> Result<Json<ProfileView>> {
    let name = request.required()?;
    let options = ProfileOptions::from(state.config.as_ref());

    let dataset = state.store.read().await;
    let view = resolve_profile(&dataset, &name, &options)?;

    tracing::debug!(name = %name, projects = view.projects.len(), "Profile resolved");
    Ok(Json(view))
}
