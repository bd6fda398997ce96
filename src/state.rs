// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::AppConfig;
use crate::explorer::{EtherscanClient, ExplorerError};
use crate::rate_limit::RateLimiter;
use crate::storage::WalletDatabase;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<WalletDatabase>,
    pub explorer: Arc<EtherscanClient>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build the state from configuration and an opened database.
    pub fn new(config: AppConfig, db: WalletDatabase) -> Result<Self, ExplorerError> {
        let explorer =
            EtherscanClient::new(&config.etherscan_api_key, &config.etherscan_base_url)?;
        let limiter = RateLimiter::per_minute(config.rate_limit);
        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            explorer: Arc::new(explorer),
            limiter: Arc::new(limiter),
        })
    }
}
