//! Account overview handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use coinshop_core::UserInfo;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance, inventory and coin history of the caller.
///
/// A valid token for an account that does not exist is treated as
/// unauthenticated.
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserInfo>, ApiError> {
    let info = state.ledger.info(&user.name).await?;

    info.map(Json).ok_or_else(|| {
        tracing::warn!(account = %user.name, "Token subject has no account");
        ApiError::Unauthorized
    })
}
