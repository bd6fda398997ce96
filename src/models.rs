// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Response types derive
//! `Serialize` and `ToSchema` for JSON output and OpenAPI documentation;
//! query strings derive `IntoParams`.
//!
//! ## Model Categories
//!
//! - **Monitor**: live explorer lookups, nothing persisted
//! - **Wallets**: registration, wallet info and sync results
//! - **Transactions**: paginated stored transactions
//! - **Health**: liveness and dependency checks

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::normalizer::TransactionItem;
use crate::storage::{Direction, Network, Page, StoredTransaction, TxStatus, User, Wallet};
use crate::sync::SyncSummary;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// Monitor Models
// =============================================================================

/// Query string of `GET /monitor/wallet`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct MonitorQuery {
    /// Wallet address (0x + 40 hex chars)
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Metadata {
    /// Number of items in `data`
    pub count: usize,
    /// Address as supplied by the caller
    pub wallet: String,
    /// Short network name, e.g. `sepolia`
    pub network: String,
}

/// Envelope returned by the monitor endpoint, on success and on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonitorResponse {
    pub status: ResponseStatus,
    pub data: Vec<TransactionItem>,
    pub metadata: Metadata,
}

impl MonitorResponse {
    pub fn success(data: Vec<TransactionItem>, wallet: &str, network: &str) -> Self {
        Self {
            status: ResponseStatus::Success,
            metadata: Metadata {
                count: data.len(),
                wallet: wallet.to_string(),
                network: network.to_string(),
            },
            data,
        }
    }

    pub fn error(wallet: &str, network: &str) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: Vec::new(),
            metadata: Metadata {
                count: 0,
                wallet: wallet.to_string(),
                network: network.to_string(),
            },
        }
    }
}

// =============================================================================
// Wallet Models
// =============================================================================

/// Register a wallet and run its first sync.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterWalletRequest {
    /// Wallet address (0x + 40 hex chars)
    pub address: String,
    /// Owner name; an existing user with this name is reused
    pub owner_name: String,
    /// Defaults to "main wallet"
    #[serde(default)]
    pub label: Option<String>,
    /// Network name, defaults to "sepolia-testnet"
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WalletSummary {
    pub wallet_id: u64,
    pub address: String,
    pub label: String,
    pub owner_name: Option<String>,
    pub network_name: String,
}

impl WalletSummary {
    pub fn new(wallet: &Wallet, owner: Option<&User>, network: &Network) -> Self {
        Self {
            wallet_id: wallet.wallet_id,
            address: wallet.address.clone(),
            label: wallet.label.clone(),
            owner_name: owner.map(|u| u.name.clone()),
            network_name: network.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterWalletResponse {
    pub wallet: WalletSummary,
    /// Outcome of the initial sync; a failed sync leaves the wallet registered
    pub sync: SyncSummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletInfoResponse {
    pub wallet: WalletSummary,
    pub transactions: TransactionPage,
}

/// Optional network restriction for wallet lookups.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NetworkQuery {
    /// Network name, e.g. "sepolia-testnet"
    pub network: Option<String>,
}

// =============================================================================
// Transaction Models
// =============================================================================

/// Stored transaction as exposed by the wallet endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionRecord {
    pub tx_hash: String,
    pub block_number: u64,
    /// RFC 3339, UTC
    pub time_stamp: String,
    pub from_address: String,
    pub to_address: String,
    pub value_eth: f64,
    pub tx_fee_eth: f64,
    pub direction: Direction,
    pub status: TxStatus,
}

impl From<StoredTransaction> for TransactionRecord {
    fn from(tx: StoredTransaction) -> Self {
        let row = tx.row;
        Self {
            time_stamp: row.time_stamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            tx_hash: row.tx_hash,
            block_number: row.block_number,
            from_address: row.from_address,
            to_address: row.to_address,
            value_eth: row.value_eth,
            tx_fee_eth: row.tx_fee_eth,
            direction: row.direction,
            status: row.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionPage {
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    pub total: u64,
    pub items: Vec<TransactionRecord>,
}

impl From<Page<StoredTransaction>> for TransactionPage {
    fn from(page: Page<StoredTransaction>) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            items: page.items.into_iter().map(TransactionRecord::from).collect(),
        }
    }
}

/// Pagination and network filter for transaction listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    pub page: Option<i64>,
    /// Items per page, 1 to 100 (default: 20)
    #[serde(rename = "pageSize")]
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
    /// Network name, e.g. "sepolia-testnet"
    pub network: Option<String>,
}

impl PageQuery {
    /// Validated `(page, page_size)`, or 422.
    pub fn resolve(&self) -> Result<(u32, u32), ApiError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64);

        if page < 1 || page > u32::MAX as i64 {
            return Err(ApiError::unprocessable("page must be a positive integer"));
        }
        if !(1..=MAX_PAGE_SIZE as i64).contains(&page_size) {
            return Err(ApiError::unprocessable(format!(
                "pageSize must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok((page as u32, page_size as u32))
    }
}

// =============================================================================
// Health Models
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the database answered a read
    pub db: bool,
    /// Whether an explorer API key is configured
    pub etherscan_key: bool,
}

/// Liveness probe response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LiveResponse {
    pub status: String,
}
