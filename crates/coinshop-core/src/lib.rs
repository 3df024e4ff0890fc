//! Core types and utilities for coinshop.
//!
//! This crate provides the foundational types shared by the ledger engine, the
//! HTTP service and the client SDK:
//!
//! - **Accounts**: `Account`
//! - **Catalog**: `Catalog`, `CatalogItem`
//! - **Inventory**: `Ownership`
//! - **Transfers**: `TransferRecord`
//! - **Aggregation**: `UserInfo`, `InventoryItem`, `CoinHistory`
//! - **Errors**: `LedgerError`, `ErrorKind`
//!
//! # Coins
//!
//! Balances, prices and transfer amounts are whole coins stored as `i64`.
//! Every account starts with the configured welcome bonus; coins only leave
//! the economy through catalog purchases.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod catalog;
pub mod config;
pub mod error;
pub mod info;
pub mod inventory;
pub mod transfer;

pub use account::Account;
pub use catalog::{Catalog, CatalogError, CatalogItem};
pub use config::{LedgerConfig, DEFAULT_WELCOME_BONUS};
pub use error::{ErrorKind, LedgerError, Result};
pub use info::{CoinHistory, InventoryItem, ReceivedCoins, SentCoins, UserInfo};
pub use inventory::Ownership;
pub use transfer::TransferRecord;
