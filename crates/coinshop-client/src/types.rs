//! Request and response types for the coinshop client.

use serde::{Deserialize, Serialize};

/// Login request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    /// Account name (10 to 200 characters).
    pub username: String,
    /// Password (ASCII letters and digits).
    pub password: String,
}

/// Login response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token.
    pub token: String,
}

/// Coin transfer request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCoinRequest {
    /// Recipient account.
    pub to_user: String,
    /// Coins to send (must be positive).
    pub amount: i64,
}

/// Error body returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub errors: String,
}
