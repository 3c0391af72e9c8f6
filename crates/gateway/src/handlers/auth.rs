//! Login and password handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{validated, ApiJson, StatusResponse};
use crate::AppState;
use portal_common::{
    auth::{self, Role},
    dataset::AccessLog,
    errors::Result,
};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 256))]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 256))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub role: Role,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(email)]
    pub email: String,

    pub old_password: String,

    #[validate(length(min = 4, max = 128))]
    pub new_password: String,
}

/// Authenticate and record the attempt in the access log
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let request = validated(request)?;

    // The read guard must be gone before the access log takes the writer lock
    let outcome = {
        let dataset = state.store.read().await;
        auth::authenticate(&dataset, &state.config.auth, &request.username, &request.password)
    };

    let entry = AccessLog::now(
        request.username.trim(),
        outcome.as_ref().ok().map(|o| o.role.as_str()),
        "login",
        outcome.is_ok(),
    );
    if let Err(e) = state.store.append_access_log(entry).await {
        tracing::warn!(error = %e, "Failed to record access log");
    }

    let outcome = outcome?;
    Ok(Json(LoginResponse {
        status: "success",
        role: outcome.role,
        name: outcome.name,
        email: outcome.email,
    }))
}

pub async fn change_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<StatusResponse>> {
    let request = validated(request)?;

    auth::change_password(
        &state.store,
        &request.email,
        &request.old_password,
        &request.new_password,
    )
    .await?;

    if let Err(e) = state
        .store
        .append_access_log(AccessLog::now(
            request.email.trim(),
            Some(Role::Academician.as_str()),
            "change_password",
            true,
        ))
        .await
    {
        tracing::warn!(error = %e, "Failed to record access log");
    }

    Ok(Json(StatusResponse::success()))
}
