// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage for monitored wallets, backed by an embedded redb file.
//!
//! ## Entities
//!
//! ```text
//! networks      known EVM networks (seeded at startup)
//! users         wallet owners, unique by name
//! wallets       (network, address) pairs owned by a user
//! transactions  normalized rows, unique per (wallet, tx_hash)
//! sync_log      one entry per sync attempt
//! ```
//!
//! Addresses are always stored lowercase.

pub mod database;
pub mod records;

pub use database::{DbError, DbResult, WalletDatabase};
pub use records::{
    Direction, Network, NewNetwork, NewSyncLog, NewTransaction, NewWallet, Page,
    StoredTransaction, SyncLog, SyncStatus, TxStatus, User, Wallet, DEFAULT_WALLET_LABEL,
};
