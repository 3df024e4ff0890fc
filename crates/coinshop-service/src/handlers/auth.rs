//! Login handler.
//!
//! The first login with a new username creates the account and grants the
//! welcome bonus; later logins must present the same password.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::crypto::{constant_time_eq, password_digest};
use crate::error::ApiError;
use crate::state::AppState;

/// Minimum username length in characters.
pub const MIN_NAME_LENGTH: usize = 10;

/// Maximum username length in characters.
pub const MAX_NAME_LENGTH: usize = 200;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    /// Account name.
    #[serde(default)]
    pub username: String,
    /// Password (ASCII letters and digits).
    #[serde(default)]
    pub password: String,
}

impl AuthRequest {
    /// Check field constraints.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` naming every invalid field.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();

        let name_length = self.username.chars().count();
        if self.username.is_empty() {
            problems.push("username: cannot be blank".to_string());
        } else if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name_length) {
            problems.push(format!(
                "username: the length must be between {MIN_NAME_LENGTH} and {MAX_NAME_LENGTH}"
            ));
        }

        if self.password.is_empty() {
            problems.push("password: cannot be blank".to_string());
        } else if !self.password.chars().all(|c| c.is_ascii_alphanumeric()) {
            problems.push("password: must contain English letters and digits only".to_string());
        }

        if problems.is_empty() {
            return Ok(());
        }

        tracing::info!(problems = ?problems, "User sent invalid auth parameters");
        Err(ApiError::BadRequest(format!(
            "invalid user auth parameters: {}",
            problems.join("; ")
        )))
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token for the other `/api` routes.
    pub token: String,
}

/// Log in, creating the account on first use.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = payload?;
    body.validate()?;

    let digest = password_digest(&state.config.secret_pepper, &body.password)
        .map_err(|e| ApiError::Internal(format!("password digest: {e}")))?;

    let (account, is_new) = state
        .ledger
        .authenticate_or_create(&body.username, &digest)
        .await?;

    if !is_new && !constant_time_eq(&digest, &account.secret) {
        tracing::warn!(account = %account.name, "Wrong password");
        return Err(ApiError::WrongPassword);
    }

    let token = state.keys.issue(&account.name)?;
    tracing::debug!(account = %account.name, is_new, "Issued token");

    Ok(Json(AuthResponse { token }))
}
