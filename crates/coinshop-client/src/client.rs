//! Coinshop HTTP client implementation.

use reqwest::{Client, StatusCode};
use std::time::Duration;

use coinshop_core::UserInfo;

use crate::error::ClientError;
use crate::types::{AuthRequest, AuthResponse, ErrorResponse, SendCoinRequest};

/// Coinshop API client.
///
/// Wraps login, the account overview, coin transfers and purchases. Every
/// call except [`CoinShopClient::authenticate`] takes the bearer token it
/// returned.
#[derive(Debug, Clone)]
pub struct CoinShopClient {
    client: Client,
    base_url: String,
}

impl CoinShopClient {
    /// Create a new coinshop client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the coinshop service (e.g., `"http://coinshop:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new coinshop client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Log in and return a bearer token.
    ///
    /// The first login with a new username creates the account.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` on a wrong password and `Rejected` when the
    /// username or password is malformed.
    pub async fn authenticate(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<String, ClientError> {
        let url = format!("{}/api/auth", self.base_url);
        let request = AuthRequest {
            username: username.into(),
            password: password.into(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let body: AuthResponse = Self::handle_response(response).await?;
        Ok(body.token)
    }

    /// Get the caller's balance, inventory and coin history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn info(&self, token: &str) -> Result<UserInfo, ClientError> {
        let url = format!("{}/api/info", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {token}"))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Send coins to another account.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` for a non-positive amount, an unknown recipient or
    /// an insufficient balance.
    pub async fn send_coin(
        &self,
        token: &str,
        to_user: impl Into<String>,
        amount: i64,
    ) -> Result<(), ClientError> {
        let url = format!("{}/api/sendCoin", self.base_url);
        let request = SendCoinRequest {
            to_user: to_user.into(),
            amount,
        };

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {token}"))
            .json(&request)
            .send()
            .await?;

        Self::handle_empty(response).await
    }

    /// Buy one unit of a catalog item.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` for an unknown item or an insufficient balance.
    pub async fn buy(&self, token: &str, item: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/buy/{item}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("authorization", format!("Bearer {token}"))
            .send()
            .await?;

        Self::handle_empty(response).await
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service reports itself
    /// degraded.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// Decode a success body or convert the error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        Err(Self::error_from(response).await)
    }

    /// Discard a success body or convert the error.
    async fn handle_empty(response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            return Ok(());
        }

        Err(Self::error_from(response).await)
    }

    /// Map an error response to a typed error.
    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.errors,
            Err(_) => format!("HTTP {status}"),
        };

        tracing::debug!(status = status.as_u16(), %message, "Coinshop request failed");

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized { message },
            StatusCode::BAD_REQUEST => ClientError::Rejected { message },
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl ClientOptions {
    /// Create options with a request timeout.
    #[must_use]
    pub fn with_timeout(timeout_seconds: u64) -> Self {
        Self { timeout_seconds }
    }
}
