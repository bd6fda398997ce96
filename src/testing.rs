// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::explorer::{EtherscanClient, KNOWN_NETWORKS};
use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::storage::{NewNetwork, WalletDatabase};

pub const WALLET: &str = "0x1111111111111111111111111111111111111111";
pub const OTHER: &str = "0x2222222222222222222222222222222222222222";

/// Serve `app` on an ephemeral local port and return the explorer URL.
pub async fn spawn_explorer(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v2/api")
}

/// URL of a local port with nothing listening on it.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/v2/api")
}

/// Raw explorer record in the shape `account/txlist` returns.
pub fn raw_tx(ts: i64, value_wei: u128, is_error: &str) -> Value {
    json!({
        "hash": format!("0x{ts:x}"),
        "blockNumber": (100_000 + ts).to_string(),
        "timeStamp": ts.to_string(),
        "from": WALLET,
        "to": OTHER,
        "value": value_wei.to_string(),
        "gasUsed": "21000",
        "isError": is_error,
    })
}

pub fn temp_db() -> (WalletDatabase, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = WalletDatabase::open(&dir.path().join("test.redb")).unwrap();
    for network in &KNOWN_NETWORKS {
        db.ensure_network(NewNetwork::from(network)).unwrap();
    }
    (db, dir)
}

/// Application state wired to a temp database and the given explorer URL.
pub fn test_state(explorer_url: &str) -> (AppState, tempfile::TempDir) {
    let (db, dir) = temp_db();
    let config = AppConfig {
        etherscan_api_key: "test-key".to_string(),
        etherscan_base_url: explorer_url.to_string(),
        database_path: dir.path().join("test.redb"),
        ..AppConfig::default()
    };
    let explorer = EtherscanClient::new(&config.etherscan_api_key, explorer_url)
        .unwrap()
        .with_backoff(vec![Duration::ZERO]);
    let state = AppState {
        limiter: Arc::new(RateLimiter::per_minute(config.rate_limit)),
        config: Arc::new(config),
        db: Arc::new(db),
        explorer: Arc::new(explorer),
    };
    (state, dir)
}
