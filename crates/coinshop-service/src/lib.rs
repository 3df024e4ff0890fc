//! Coinshop HTTP API Service.
//!
//! Exposes the coin ledger over HTTP:
//!
//! - Login with automatic account creation and welcome bonus
//! - Account overview (balance, inventory, coin history)
//! - Coin transfers between accounts
//! - Merch purchases
//!
//! # Authentication
//!
//! `POST /api/auth` exchanges a username and password for an HS256 bearer
//! token; every other `/api` route requires `Authorization: Bearer <token>`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthUser, JwtClaims, TokenKeys};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
