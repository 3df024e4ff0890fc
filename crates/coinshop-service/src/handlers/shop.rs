//! Coin transfer and merch purchase handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Coin transfer request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    /// Recipient account name.
    pub to_user: String,
    /// Coins to send (must be positive).
    pub amount: i64,
}

/// Send coins from the caller to another account.
pub async fn send_coin(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<SendCoinRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = payload?;

    tracing::debug!(
        sender = %user.name,
        recipient = %body.to_user,
        amount = body.amount,
        "Processing coin transfer"
    );

    state
        .ledger
        .send(&user.name, &body.to_user, body.amount)
        .await?;

    Ok(StatusCode::OK)
}

/// Buy one unit of a merch item for the caller.
pub async fn buy_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    item: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(item) = item?;

    state.ledger.purchase(&user.name, &item).await?;

    Ok(StatusCode::OK)
}
