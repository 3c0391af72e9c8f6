//! API handlers module

pub mod admin;
pub mod announcements;
pub mod auth;
pub mod decisions;
pub mod files;
pub mod health;
pub mod messages;
pub mod network;
pub mod profile;
pub mod projects;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use portal_common::errors::AppError;

/// JSON body extractor whose rejections use the portal error format.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::InvalidFormat {
                message: rejection.body_text(),
            }),
        }
    }
}

/// Run `validator` checks, mapping failures to a 400.
pub fn validated<T: Validate>(request: T) -> Result<T, AppError> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;
    Ok(request)
}

/// Body carrying a single academician name.
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

impl NameRequest {
    pub fn required(self) -> Result<String, AppError> {
        self.name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::MissingField {
                field: "name".to_string(),
            })
    }
}

/// `{"status": "success"}`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

/// Accept ids exported either as strings or as numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
