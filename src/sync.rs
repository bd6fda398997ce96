// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Sync
//!
//! One-shot reconciliation of a registered wallet against the explorer:
//!
//! 1. Fetch the wallet's transaction list for the network's chain ID.
//! 2. Normalize it (newest first, at most 500 items).
//! 3. Derive each row's direction and insert rows not yet stored for the wallet.
//! 4. Record the attempt in the sync log, whether it succeeded or not.
//!
//! There is no background polling; syncs run at registration time and on
//! explicit request.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::explorer::{EtherscanClient, ExplorerError, TxListOutcome};
use crate::normalizer::{self, NormalizeError, TransactionItem};
use crate::storage::{DbError, DbResult, Network, NewSyncLog, SyncStatus, Wallet, WalletDatabase};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Explorer(#[from] ExplorerError),

    #[error("explorer rate limited: {0}")]
    RateLimited(String),

    #[error("explorer error: {0}")]
    Upstream(String),

    #[error("malformed explorer response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Result of one sync attempt, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SyncSummary {
    pub status: SyncStatus,
    /// Rows inserted by this sync
    pub new_tx_count: u64,
    /// Items received from the explorer after normalization
    pub fetched: usize,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncSummary {
    /// Summary for a sync that failed before anything was stored.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Failed,
            new_tx_count: 0,
            fetched: 0,
            from_block: None,
            to_block: None,
            message: Some(message.into()),
        }
    }
}

/// Insert the items not yet stored for `wallet`. Returns the number inserted.
pub fn upsert_transactions(
    db: &WalletDatabase,
    wallet: &Wallet,
    items: &[TransactionItem],
) -> DbResult<usize> {
    let rows: Vec<_> = items
        .iter()
        .map(|item| {
            normalizer::to_db_row(item, wallet.wallet_id, wallet.network_id, &wallet.address)
        })
        .collect();
    db.insert_new_transactions(&rows)
}

/// Fetch, normalize and store a wallet's transactions, then log the attempt.
///
/// Store work runs on the blocking pool.
pub async fn sync_wallet(
    db: &Arc<WalletDatabase>,
    explorer: &EtherscanClient,
    wallet: &Wallet,
    network: &Network,
) -> Result<SyncSummary, SyncError> {
    match fetch_and_store(db, explorer, wallet, network).await {
        Ok(summary) => {
            let log = NewSyncLog {
                wallet_id: wallet.wallet_id,
                network_id: network.network_id,
                from_block: summary.from_block,
                to_block: summary.to_block,
                new_tx_count: summary.new_tx_count,
                status: SyncStatus::Success,
                message: None,
            };
            db.blocking(move |db| db.record_sync(log)).await?;
            info!(
                wallet = %wallet.address,
                network = %network.name,
                fetched = summary.fetched,
                new_tx_count = summary.new_tx_count,
                "Wallet sync completed"
            );
            Ok(summary)
        }
        Err(e) => {
            warn!(
                wallet = %wallet.address,
                network = %network.name,
                error = %e,
                "Wallet sync failed"
            );
            let log = NewSyncLog {
                wallet_id: wallet.wallet_id,
                network_id: network.network_id,
                from_block: None,
                to_block: None,
                new_tx_count: 0,
                status: SyncStatus::Failed,
                message: Some(e.to_string()),
            };
            if let Err(log_err) = db.blocking(move |db| db.record_sync(log)).await {
                warn!(error = %log_err, "Failed to record sync failure");
            }
            Err(e)
        }
    }
}

async fn fetch_and_store(
    db: &Arc<WalletDatabase>,
    explorer: &EtherscanClient,
    wallet: &Wallet,
    network: &Network,
) -> Result<SyncSummary, SyncError> {
    let response = explorer.get_txlist(&wallet.address, network.chain_id).await?;

    let raw = match response.outcome() {
        TxListOutcome::Transactions(raw) => raw,
        TxListOutcome::NoTransactions => Vec::new(),
        TxListOutcome::RateLimited(msg) => {
            warn!(wallet = %wallet.address, "etherscan_rate_limited");
            return Err(SyncError::RateLimited(msg));
        }
        TxListOutcome::Failed(msg) => return Err(SyncError::Upstream(msg)),
        TxListOutcome::Malformed(msg) => return Err(SyncError::Malformed(msg)),
    };

    let items = normalizer::to_transaction_items(&raw, &wallet.address)?;
    let summary = SyncSummary {
        status: SyncStatus::Success,
        new_tx_count: 0,
        fetched: items.len(),
        from_block: items.iter().map(|i| i.block_number).min(),
        to_block: items.iter().map(|i| i.block_number).max(),
        message: None,
    };

    let owner = wallet.clone();
    let inserted = db
        .blocking(move |db| upsert_transactions(db, &owner, &items))
        .await?;

    Ok(SyncSummary {
        new_tx_count: inserted as u64,
        ..summary
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::SEPOLIA;
    use crate::storage::{Direction, NewWallet};
    use crate::testing::{closed_port_url, raw_tx, spawn_explorer, temp_db, OTHER, WALLET};
    use axum::{routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn client(base: &str) -> EtherscanClient {
        EtherscanClient::new("test-key", base)
            .unwrap()
            .with_backoff(vec![Duration::ZERO])
    }

    fn store() -> (Arc<WalletDatabase>, tempfile::TempDir) {
        let (db, dir) = temp_db();
        (Arc::new(db), dir)
    }

    fn register(db: &WalletDatabase) -> (Wallet, Network) {
        let network = db.network_by_chain_id(SEPOLIA.chain_id).unwrap().unwrap();
        let user = db.get_or_create_user("alice").unwrap();
        let wallet = db
            .create_wallet(NewWallet {
                user_id: user.user_id,
                network_id: network.network_id,
                address: WALLET.to_string(),
                label: None,
            })
            .unwrap();
        (wallet, network)
    }

    async fn explorer_returning(body: Value) -> String {
        let app = Router::new().route(
            "/v2/api",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );
        spawn_explorer(app).await
    }

    #[tokio::test]
    async fn sync_inserts_then_dedupes() {
        let (db, _dir) = store();
        let (wallet, network) = register(&db);
        let mut incoming = raw_tx(300, 5, "0");
        incoming["from"] = json!(OTHER);
        incoming["to"] = json!(WALLET.to_uppercase().replacen("0X", "0x", 1));
        let base = explorer_returning(json!({
            "status": "1",
            "message": "OK",
            "result": [raw_tx(100, 1, "0"), raw_tx(200, 2, "1"), incoming]
        }))
        .await;
        let explorer = client(&base);

        let first = sync_wallet(&db, &explorer, &wallet, &network).await.unwrap();
        assert_eq!(first.status, SyncStatus::Success);
        assert_eq!(first.fetched, 3);
        assert_eq!(first.new_tx_count, 3);
        assert_eq!(first.from_block, Some(100_100));
        assert_eq!(first.to_block, Some(100_300));

        let second = sync_wallet(&db, &explorer, &wallet, &network).await.unwrap();
        assert_eq!(second.new_tx_count, 0);
        assert_eq!(db.count_transactions(wallet.wallet_id).unwrap(), 3);

        let page = db.list_transactions(wallet.wallet_id, 1, 10).unwrap();
        assert_eq!(page.items[0].row.direction, Direction::In);
        assert_eq!(page.items[1].row.direction, Direction::Out);

        let log = db.latest_sync(wallet.wallet_id).unwrap().unwrap();
        assert_eq!(log.status, SyncStatus::Success);
        assert_eq!(log.new_tx_count, 0);
    }

    #[tokio::test]
    async fn no_transactions_is_a_successful_empty_sync() {
        let (db, _dir) = store();
        let (wallet, network) = register(&db);
        let base = explorer_returning(json!({
            "status": "0",
            "message": "No transactions found",
            "result": []
        }))
        .await;

        let summary = sync_wallet(&db, &client(&base), &wallet, &network)
            .await
            .unwrap();
        assert_eq!(summary.fetched, 0);
        assert_eq!(summary.from_block, None);
    }

    #[tokio::test]
    async fn rate_limit_fails_and_is_logged() {
        let (db, _dir) = store();
        let (wallet, network) = register(&db);
        let base = explorer_returning(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }))
        .await;

        let err = sync_wallet(&db, &client(&base), &wallet, &network)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RateLimited(_)));

        let log = db.latest_sync(wallet.wallet_id).unwrap().unwrap();
        assert_eq!(log.status, SyncStatus::Failed);
        assert!(log.message.unwrap().contains("Max rate limit"));
    }

    #[tokio::test]
    async fn non_numeric_field_fails_without_inserting() {
        let (db, _dir) = store();
        let (wallet, network) = register(&db);
        let mut bad = raw_tx(10, 1, "0");
        bad["blockNumber"] = json!("pending");
        let base = explorer_returning(json!({
            "status": "1",
            "message": "OK",
            "result": [raw_tx(20, 1, "0"), bad]
        }))
        .await;

        let err = sync_wallet(&db, &client(&base), &wallet, &network)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Normalize(_)));
        assert_eq!(db.count_transactions(wallet.wallet_id).unwrap(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_an_explorer_error() {
        let (db, _dir) = store();
        let (wallet, network) = register(&db);
        let base = closed_port_url().await;

        let err = sync_wallet(&db, &client(&base), &wallet, &network)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Explorer(ExplorerError::Request(_))));
    }

    #[test]
    fn upsert_skips_duplicate_hashes_in_batch() {
        let (db, _dir) = temp_db();
        let (wallet, _) = register(&db);
        let raw: Vec<_> = [raw_tx(1, 1, "0"), raw_tx(1, 1, "0"), raw_tx(2, 1, "0")]
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        let items = normalizer::to_transaction_items(&raw, WALLET).unwrap();

        assert_eq!(upsert_transactions(&db, &wallet, &items).unwrap(), 2);
        assert_eq!(upsert_transactions(&db, &wallet, &items).unwrap(), 0);
    }
}
