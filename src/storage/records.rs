// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted record types.
//!
//! Each entity is stored as JSON in its own redb table, keyed by a numeric
//! identifier allocated from the `counters` table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::explorer::NetworkConfig;

/// Label given to wallets registered without one.
pub const DEFAULT_WALLET_LABEL: &str = "main wallet";

/// Transaction direction relative to the owning wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Direction {
    /// Wallet is the recipient
    #[serde(rename = "in")]
    In,
    /// Wallet is the sender
    #[serde(rename = "out")]
    Out,
    /// Wallet is both sides, or neither
    #[serde(rename = "self")]
    SelfTransfer,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::SelfTransfer => "self",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution status reported by the explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
}

/// Outcome of a wallet sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub network_id: u64,
    pub name: String,
    pub chain_id: u64,
    pub symbol_native: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNetwork {
    pub name: String,
    pub chain_id: u64,
    pub symbol_native: String,
    pub explorer_url: Option<String>,
    pub api_base_url: Option<String>,
}

impl From<&NetworkConfig> for NewNetwork {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            name: config.name.to_string(),
            chain_id: config.chain_id,
            symbol_native: config.symbol.to_string(),
            explorer_url: Some(config.explorer_url.to_string()),
            api_base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: u64,
    pub user_id: u64,
    pub network_id: u64,
    /// Lowercase 0x-prefixed address
    pub address: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWallet {
    pub user_id: u64,
    pub network_id: u64,
    pub address: String,
    pub label: Option<String>,
}

/// Transaction row ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub network_id: u64,
    pub wallet_id: u64,
    pub tx_hash: String,
    pub block_number: u64,
    pub time_stamp: DateTime<Utc>,
    pub from_address: String,
    pub to_address: String,
    pub value_eth: f64,
    pub gas_used: u64,
    pub tx_fee_eth: f64,
    pub direction: Direction,
    pub status: TxStatus,
}

/// Stored transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub tx_id: u64,
    #[serde(flatten)]
    pub row: NewTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLog {
    pub sync_id: u64,
    pub wallet_id: u64,
    pub network_id: u64,
    pub synced_at: DateTime<Utc>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub new_tx_count: u64,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncLog {
    pub wallet_id: u64,
    pub network_id: u64,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub new_tx_count: u64,
    pub status: SyncStatus,
    pub message: Option<String>,
}

/// One page of an offset-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub items: Vec<T>,
}
