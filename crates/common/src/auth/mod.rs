//! Authentication utilities
//!
//! Provides:
//! - Credential checks for the configured admin and for academicians
//! - Password change validation

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::dataset::{email_key, Academician, Dataset};
use crate::errors::{AppError, Result};
use crate::metrics;
use crate::store::DataStore;

pub const MIN_PASSWORD_LEN: usize = 4;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Who logged in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Academician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Academician => "academician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful login
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginOutcome {
    pub role: Role,
    /// Display name: the admin's configured name or the academician's Fullname
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Check `username`/`password` against the admin account, then the
/// academician table.
pub fn authenticate(
    dataset: &Dataset,
    admin: &AuthConfig,
    username: &str,
    password: &str,
) -> Result<LoginOutcome> {
    let username = email_key(username);
    let password = password.trim();

    if username == admin.admin_username.trim().to_lowercase() {
        let ok = password == admin.admin_password;
        metrics::record_login(Role::Admin.as_str(), ok);
        if !ok {
            warn!("Admin login rejected");
            return Err(AppError::InvalidCredentials);
        }
        info!("Admin logged in");
        return Ok(LoginOutcome {
            role: Role::Admin,
            name: admin.admin_display_name.clone(),
            email: None,
        });
    }

    match verify_academician(dataset, &username, password) {
        Ok(academician) => {
            metrics::record_login(Role::Academician.as_str(), true);
            info!(email = %academician.email, "Academician logged in");
            Ok(LoginOutcome {
                role: Role::Academician,
                name: academician.fullname.clone(),
                email: Some(academician.email.clone()),
            })
        }
        Err(e) => {
            metrics::record_login(Role::Academician.as_str(), false);
            warn!(user = %username, "Academician login rejected");
            Err(e)
        }
    }
}

/// The academician behind `email` when `password` matches the stored
/// password, or the email user part when none is stored.
pub fn verify_academician<'a>(
    dataset: &'a Dataset,
    email: &str,
    password: &str,
) -> Result<&'a Academician> {
    let academician = dataset
        .academician_by_email(email)
        .ok_or(AppError::InvalidCredentials)?;

    let expected = match dataset.password_for(email) {
        Some(stored) => stored.to_string(),
        None => academician.email_user(),
    };

    if password.trim() == expected {
        Ok(academician)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

pub fn validate_new_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        Ok(())
    } else {
        Err(AppError::Validation {
            message: format!(
                "Password must be between {} and {} characters",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            ),
            field: Some("new_password".to_string()),
        })
    }
}

/// Verify the old password and persist the new one. Passwords are compared
/// trimmed at login, so the new one is stored trimmed.
pub async fn change_password(
    store: &DataStore,
    email: &str,
    old_password: &str,
    new_password: &str,
) -> Result<()> {
    let new_password = new_password.trim();
    validate_new_password(new_password)?;
    store
        .set_password(email, new_password, |dataset| {
            verify_academician(dataset, email, old_password).map(|_| ())
        })
        .await?;
    info!(email = %email_key(email), "Password changed");
    Ok(())
}
