//! Coinshop Client SDK
//!
//! Client library for talking to the coinshop HTTP API.
//!
//! # Example
//!
//! ```rust,no_run
//! use coinshop_client::CoinShopClient;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CoinShopClient::new("http://coinshop:8080")?;
//!
//!     // Log in (the account is created with the welcome bonus on first use)
//!     let token = client.authenticate("alice-the-buyer", "secret123").await?;
//!
//!     // Spend some coins
//!     client.buy(&token, "pen").await?;
//!     client.send_coin(&token, "bob-the-receiver", 100).await?;
//!
//!     let info = client.info(&token).await?;
//!     println!("{} coins left", info.coins);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, CoinShopClient};
pub use error::ClientError;
pub use types::*;

// Re-export core types that clients might need
pub use coinshop_core::{CoinHistory, InventoryItem, ReceivedCoins, SentCoins, UserInfo};
