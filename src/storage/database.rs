// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallet database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `networks`: network_id → serialized Network
//! - `network_by_chain`: chain_id → network_id
//! - `users`: user_id → serialized User
//! - `user_by_name`: name → user_id
//! - `wallets`: wallet_id → serialized Wallet
//! - `wallet_by_address`: (address|network_id_be) → wallet_id
//! - `transactions`: (wallet_id_be|tx_hash) → serialized StoredTransaction
//! - `wallet_tx_index`: (wallet_id_be|!ordered_timestamp_be|tx_hash) → tx_id
//! - `sync_log`: sync_id → serialized SyncLog
//! - `wallet_sync_index`: (wallet_id_be|!sync_id_be) → sync_id
//! - `counters`: entity name → last allocated id

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

use super::records::{
    Network, NewNetwork, NewSyncLog, NewTransaction, NewWallet, Page, StoredTransaction, SyncLog,
    User, Wallet, DEFAULT_WALLET_LABEL,
};

// =============================================================================
// Table Definitions
// =============================================================================

const NETWORKS: TableDefinition<u64, &[u8]> = TableDefinition::new("networks");
const NETWORK_BY_CHAIN: TableDefinition<u64, u64> = TableDefinition::new("network_by_chain");
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const USER_BY_NAME: TableDefinition<&str, u64> = TableDefinition::new("user_by_name");
const WALLETS: TableDefinition<u64, &[u8]> = TableDefinition::new("wallets");
const WALLET_BY_ADDRESS: TableDefinition<&[u8], u64> = TableDefinition::new("wallet_by_address");

/// Primary transaction table. The key enforces one row per (wallet, hash).
const TRANSACTIONS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("transactions");

/// Newest-first index over a wallet's transactions.
const WALLET_TX_INDEX: TableDefinition<&[u8], u64> = TableDefinition::new("wallet_tx_index");

const SYNC_LOG: TableDefinition<u64, &[u8]> = TableDefinition::new("sync_log");
const WALLET_SYNC_INDEX: TableDefinition<&[u8], u64> = TableDefinition::new("wallet_sync_index");
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const NETWORK_SEQ: &str = "network";
const USER_SEQ: &str = "user";
const WALLET_SEQ: &str = "wallet";
const TX_SEQ: &str = "transaction";
const SYNC_SEQ: &str = "sync";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database task failed: {0}")]
    Task(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// `wallet_id_be | tx_hash`
fn make_tx_key(wallet_id: u64, tx_hash: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + tx_hash.len());
    key.extend_from_slice(&wallet_id.to_be_bytes());
    key.extend_from_slice(tx_hash.as_bytes());
    key
}

/// `wallet_id_be | !(timestamp ^ sign)_be | tx_hash`
///
/// Flipping the sign bit maps `i64` onto `u64` in order, including negative
/// timestamps. Inverting that makes a forward scan return newest first; equal
/// timestamps fall back to hash order.
fn make_index_key(wallet_id: u64, timestamp: i64, tx_hash: &str) -> Vec<u8> {
    let ordered = (timestamp as u64) ^ (1 << 63);
    let mut key = Vec::with_capacity(16 + tx_hash.len());
    key.extend_from_slice(&wallet_id.to_be_bytes());
    key.extend_from_slice(&(!ordered).to_be_bytes());
    key.extend_from_slice(tx_hash.as_bytes());
    key
}

/// `address | network_id_be`
fn make_address_key(address: &str, network_id: u64) -> Vec<u8> {
    let addr = address.to_lowercase();
    let mut key = Vec::with_capacity(addr.len() + 1 + 8);
    key.extend_from_slice(addr.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&network_id.to_be_bytes());
    key
}

/// `wallet_id_be | !sync_id_be`
fn make_sync_key(wallet_id: u64, sync_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&wallet_id.to_be_bytes());
    key.extend_from_slice(&(!sync_id).to_be_bytes());
    key
}

/// Range bounds covering every key that starts with `wallet_id_be`.
fn wallet_range(wallet_id: u64) -> (Vec<u8>, Vec<u8>) {
    let start = wallet_id.to_be_bytes().to_vec();
    let end = match wallet_id.checked_add(1) {
        Some(next) => next.to_be_bytes().to_vec(),
        None => vec![0xFF; 9],
    };
    (start, end)
}

fn address_range(address: &str) -> (Vec<u8>, Vec<u8>) {
    let addr = address.to_lowercase();
    let mut start = Vec::with_capacity(addr.len() + 1);
    start.extend_from_slice(addr.as_bytes());
    start.push(b'|');
    let mut end = start.clone();
    end.extend_from_slice(&[0xFF; 9]);
    (start, end)
}

fn to_json<T: Serialize>(value: &T) -> DbResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Allocate the next id for `sequence` inside an open write transaction.
fn next_id(txn: &WriteTransaction, sequence: &str) -> DbResult<u64> {
    let mut table = txn.open_table(COUNTERS)?;
    let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// WalletDatabase
// =============================================================================

/// Embedded ACID store for networks, users, wallets and their transactions.
pub struct WalletDatabase {
    db: Database,
}

impl WalletDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NETWORKS)?;
            let _ = write_txn.open_table(NETWORK_BY_CHAIN)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_BY_NAME)?;
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(WALLET_BY_ADDRESS)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(WALLET_TX_INDEX)?;
            let _ = write_txn.open_table(SYNC_LOG)?;
            let _ = write_txn.open_table(WALLET_SYNC_INDEX)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Run store operations on tokio's blocking pool.
    ///
    /// Every write commits with an fsync, so async callers go through here
    /// instead of touching the database on a runtime worker.
    pub async fn blocking<T, E, F>(self: &Arc<Self>, op: F) -> Result<T, E>
    where
        F: FnOnce(&WalletDatabase) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        let db = Arc::clone(self);
        match tokio::task::spawn_blocking(move || op(&db)).await {
            Ok(result) => result,
            Err(e) => Err(E::from(DbError::Task(e.to_string()))),
        }
    }

    /// Cheap liveness probe used by the health endpoint.
    pub fn ping(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NETWORKS)?;
        table.len()?;
        Ok(())
    }

    // =========================================================================
    // Networks
    // =========================================================================

    /// Insert a network unless one with the same chain ID already exists.
    pub fn ensure_network(&self, new: NewNetwork) -> DbResult<Network> {
        if let Some(existing) = self.network_by_chain_id(new.chain_id)? {
            return Ok(existing);
        }

        let write_txn = self.db.begin_write()?;
        let network = {
            let network_id = next_id(&write_txn, NETWORK_SEQ)?;
            let network = Network {
                network_id,
                name: new.name,
                chain_id: new.chain_id,
                symbol_native: new.symbol_native,
                explorer_url: new.explorer_url,
                api_base_url: new.api_base_url,
            };
            let mut table = write_txn.open_table(NETWORKS)?;
            table.insert(network_id, to_json(&network)?.as_slice())?;
            let mut by_chain = write_txn.open_table(NETWORK_BY_CHAIN)?;
            by_chain.insert(network.chain_id, network_id)?;
            network
        };
        write_txn.commit()?;

        tracing::debug!(
            network_id = network.network_id,
            chain_id = network.chain_id,
            name = %network.name,
            "Network registered"
        );
        Ok(network)
    }

    pub fn get_network(&self, network_id: u64) -> DbResult<Option<Network>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NETWORKS)?;
        match table.get(network_id)? {
            Some(value) => Ok(Some(from_json(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn network_by_chain_id(&self, chain_id: u64) -> DbResult<Option<Network>> {
        let network_id = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(NETWORK_BY_CHAIN)?;
            let id = table.get(chain_id)?.map(|v| v.value());
            id
        };
        match network_id {
            Some(id) => self.get_network(id),
            None => Ok(None),
        }
    }

    pub fn network_by_name(&self, name: &str) -> DbResult<Option<Network>> {
        let name = name.trim();
        Ok(self
            .list_networks()?
            .into_iter()
            .find(|n| n.name.eq_ignore_ascii_case(name)))
    }

    /// Network with the lowest id, if any.
    pub fn first_network(&self) -> DbResult<Option<Network>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NETWORKS)?;
        let network = match table.first()? {
            Some((_, value)) => Some(from_json(value.value())?),
            None => None,
        };
        Ok(network)
    }

    pub fn list_networks(&self) -> DbResult<Vec<Network>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(NETWORKS)?;
        let mut networks = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            networks.push(from_json(value.value())?);
        }
        Ok(networks)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Find a user by exact (trimmed) name, creating it when absent.
    pub fn get_or_create_user(&self, name: &str) -> DbResult<User> {
        let name = name.trim();
        let write_txn = self.db.begin_write()?;
        let user = {
            let existing = {
                let by_name = write_txn.open_table(USER_BY_NAME)?;
                let id = by_name.get(name)?.map(|v| v.value());
                id
            };

            match existing {
                Some(user_id) => {
                    let users = write_txn.open_table(USERS)?;
                    let user = match users.get(user_id)? {
                        Some(value) => from_json(value.value())?,
                        None => return Err(DbError::NotFound(format!("User {user_id}"))),
                    };
                    user
                }
                None => {
                    let user_id = next_id(&write_txn, USER_SEQ)?;
                    let user = User {
                        user_id,
                        name: name.to_string(),
                        created_at: Utc::now(),
                    };
                    let mut users = write_txn.open_table(USERS)?;
                    users.insert(user_id, to_json(&user)?.as_slice())?;
                    let mut by_name = write_txn.open_table(USER_BY_NAME)?;
                    by_name.insert(name, user_id)?;
                    user
                }
            }
        };
        write_txn.commit()?;
        Ok(user)
    }

    pub fn get_user(&self, user_id: u64) -> DbResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(from_json(value.value())?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Wallets
    // =========================================================================

    /// Create a wallet. Addresses are stored lowercase and are unique per network.
    pub fn create_wallet(&self, new: NewWallet) -> DbResult<Wallet> {
        let address = new.address.trim().to_lowercase();
        let address_key = make_address_key(&address, new.network_id);

        let write_txn = self.db.begin_write()?;
        let wallet = {
            let mut by_address = write_txn.open_table(WALLET_BY_ADDRESS)?;
            if by_address.get(address_key.as_slice())?.is_some() {
                return Err(DbError::AlreadyExists(format!(
                    "Wallet {address} on network {}",
                    new.network_id
                )));
            }

            let wallet_id = next_id(&write_txn, WALLET_SEQ)?;
            let label = new
                .label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| DEFAULT_WALLET_LABEL.to_string());
            let wallet = Wallet {
                wallet_id,
                user_id: new.user_id,
                network_id: new.network_id,
                address,
                label,
                created_at: Utc::now(),
            };

            let mut wallets = write_txn.open_table(WALLETS)?;
            wallets.insert(wallet_id, to_json(&wallet)?.as_slice())?;
            by_address.insert(address_key.as_slice(), wallet_id)?;
            wallet
        };
        write_txn.commit()?;
        Ok(wallet)
    }

    pub fn get_wallet(&self, wallet_id: u64) -> DbResult<Option<Wallet>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        match table.get(wallet_id)? {
            Some(value) => Ok(Some(from_json(value.value())?)),
            None => Ok(None),
        }
    }

    /// Find a wallet by network and address (case-insensitive).
    pub fn find_wallet(&self, network_id: u64, address: &str) -> DbResult<Option<Wallet>> {
        let key = make_address_key(address.trim(), network_id);
        let wallet_id = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(WALLET_BY_ADDRESS)?;
            let id = table.get(key.as_slice())?.map(|v| v.value());
            id
        };
        match wallet_id {
            Some(id) => self.get_wallet(id),
            None => Ok(None),
        }
    }

    /// Find a wallet by address on any network; the lowest network id wins.
    pub fn find_wallet_by_address(&self, address: &str) -> DbResult<Option<Wallet>> {
        let (start, end) = address_range(address.trim());
        let wallet_id = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(WALLET_BY_ADDRESS)?;
            let mut range = table.range(start.as_slice()..end.as_slice())?;
            let first = match range.next() {
                Some(entry) => Some(entry?.1.value()),
                None => None,
            };
            first
        };
        match wallet_id {
            Some(id) => self.get_wallet(id),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub fn transaction_exists(&self, wallet_id: u64, tx_hash: &str) -> DbResult<bool> {
        let key = make_tx_key(wallet_id, tx_hash);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRANSACTIONS)?;
        let exists = table.get(key.as_slice())?.is_some();
        Ok(exists)
    }

    /// Insert a single row. Returns `false` when `(wallet_id, tx_hash)` is already stored.
    pub fn insert_transaction(&self, row: NewTransaction) -> DbResult<bool> {
        Ok(self.insert_new_transactions(std::slice::from_ref(&row))? == 1)
    }

    /// Insert every row whose `(wallet_id, tx_hash)` is not stored yet.
    ///
    /// Runs in one write transaction, so duplicates inside `rows` are also
    /// skipped. Returns the number of rows inserted.
    pub fn insert_new_transactions(&self, rows: &[NewTransaction]) -> DbResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let write_txn = self.db.begin_write()?;
        let mut inserted = 0;
        {
            let mut tx_table = write_txn.open_table(TRANSACTIONS)?;
            let mut idx_table = write_txn.open_table(WALLET_TX_INDEX)?;

            for row in rows {
                let key = make_tx_key(row.wallet_id, &row.tx_hash);
                if tx_table.get(key.as_slice())?.is_some() {
                    continue;
                }

                let tx_id = next_id(&write_txn, TX_SEQ)?;
                let stored = StoredTransaction {
                    tx_id,
                    row: row.clone(),
                };
                tx_table.insert(key.as_slice(), to_json(&stored)?.as_slice())?;

                let idx_key =
                    make_index_key(row.wallet_id, row.time_stamp.timestamp(), &row.tx_hash);
                idx_table.insert(idx_key.as_slice(), tx_id)?;
                inserted += 1;
            }
        }
        write_txn.commit()?;
        Ok(inserted)
    }

    pub fn count_transactions(&self, wallet_id: u64) -> DbResult<u64> {
        let (start, end) = wallet_range(wallet_id);
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(WALLET_TX_INDEX)?;
        let mut total = 0;
        for entry in idx_table.range(start.as_slice()..end.as_slice())? {
            entry?;
            total += 1;
        }
        Ok(total)
    }

    /// Offset-paginated, newest-first listing of a wallet's transactions.
    ///
    /// `page` is 1-based. Pages past the end come back empty with the real total.
    pub fn list_transactions(
        &self,
        wallet_id: u64,
        page: u32,
        page_size: u32,
    ) -> DbResult<Page<StoredTransaction>> {
        let (start, end) = wallet_range(wallet_id);
        let offset = (page.max(1) as u64 - 1) * page_size as u64;

        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(WALLET_TX_INDEX)?;
        let tx_table = read_txn.open_table(TRANSACTIONS)?;

        let mut total = 0u64;
        let mut items = Vec::with_capacity(page_size as usize);

        for entry in idx_table.range(start.as_slice()..end.as_slice())? {
            let (key, _) = entry?;
            let position = total;
            total += 1;

            if position < offset || items.len() >= page_size as usize {
                continue;
            }

            let key_bytes = key.value();
            let Some(tx_hash) = extract_tx_hash_from_index_key(key_bytes) else {
                continue;
            };
            let tx_key = make_tx_key(wallet_id, tx_hash);
            if let Some(value) = tx_table.get(tx_key.as_slice())? {
                items.push(from_json(value.value())?);
            }
        }

        Ok(Page {
            page,
            page_size,
            total,
            items,
        })
    }

    // =========================================================================
    // Sync log
    // =========================================================================

    pub fn record_sync(&self, new: NewSyncLog) -> DbResult<SyncLog> {
        let write_txn = self.db.begin_write()?;
        let log = {
            let sync_id = next_id(&write_txn, SYNC_SEQ)?;
            let log = SyncLog {
                sync_id,
                wallet_id: new.wallet_id,
                network_id: new.network_id,
                synced_at: Utc::now(),
                from_block: new.from_block,
                to_block: new.to_block,
                new_tx_count: new.new_tx_count,
                status: new.status,
                message: new.message,
            };
            let mut table = write_txn.open_table(SYNC_LOG)?;
            table.insert(sync_id, to_json(&log)?.as_slice())?;
            let mut idx = write_txn.open_table(WALLET_SYNC_INDEX)?;
            idx.insert(make_sync_key(log.wallet_id, sync_id).as_slice(), sync_id)?;
            log
        };
        write_txn.commit()?;
        Ok(log)
    }

    /// Most recent sync attempt for a wallet.
    pub fn latest_sync(&self, wallet_id: u64) -> DbResult<Option<SyncLog>> {
        let (start, end) = wallet_range(wallet_id);
        let read_txn = self.db.begin_read()?;
        let idx = read_txn.open_table(WALLET_SYNC_INDEX)?;
        let sync_id = match idx.range(start.as_slice()..end.as_slice())?.next() {
            Some(entry) => entry?.1.value(),
            None => return Ok(None),
        };
        let table = read_txn.open_table(SYNC_LOG)?;
        match table.get(sync_id)? {
            Some(value) => Ok(Some(from_json(value.value())?)),
            None => Ok(None),
        }
    }
}

/// Extract the tx_hash portion of a `wallet_tx_index` key.
fn extract_tx_hash_from_index_key(key: &[u8]) -> Option<&str> {
    key.get(16..).and_then(|rest| std::str::from_utf8(rest).ok())
}

// =============================================================================
// Tests
// =============================================================================
