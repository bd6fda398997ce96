// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Etherscan-compatible HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use super::types::TxListResponse;

/// Attempts per request, including the first one.
const MAX_ATTEMPTS: usize = 3;

/// Total time budget for a single HTTP attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sleep before attempt N+1 after attempt N failed.
const DEFAULT_BACKOFF: [Duration; 3] = [
    Duration::from_millis(200),
    Duration::from_millis(500),
    Duration::from_millis(1000),
];

#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("Invalid explorer URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Explorer request failed: {0}")]
    Request(String),

    #[error("Explorer response could not be decoded: {0}")]
    Decode(String),
}

/// Result of one HTTP attempt.
enum Attempt {
    Response(TxListResponse),
    ServerError(reqwest::StatusCode),
}

/// Client for the `account/txlist` endpoint.
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    api_key: String,
    base_url: String,
    backoff: Vec<Duration>,
    http: Client,
}

impl EtherscanClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ExplorerError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| ExplorerError::InvalidBaseUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExplorerError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            backoff: DEFAULT_BACKOFF.to_vec(),
            http,
        })
    }

    /// Override the sleep schedule between attempts.
    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the newest-first transaction list for `address` on `chain_id`.
    ///
    /// Server errors and transport failures are retried up to
    /// [`MAX_ATTEMPTS`] times. Persistent 5xx answers collapse into
    /// [`TxListResponse::server_error`]; persistent transport failures are
    /// returned as errors.
    pub async fn get_txlist(
        &self,
        address: &str,
        chain_id: u64,
    ) -> Result<TxListResponse, ExplorerError> {
        let chain_id = chain_id.to_string();
        let params = [
            ("module", "account"),
            ("chainid", chain_id.as_str()),
            ("action", "txlist"),
            ("address", address),
            ("sort", "desc"),
            ("apikey", self.api_key.as_str()),
        ];

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(&params).await {
                Ok(Attempt::Response(body)) => return Ok(body),
                Ok(Attempt::ServerError(status)) => {
                    if attempt >= MAX_ATTEMPTS {
                        warn!(
                            address = %address,
                            status = status.as_u16(),
                            "Explorer kept failing with server errors"
                        );
                        return Ok(TxListResponse::server_error());
                    }
                    warn!(attempt, status = status.as_u16(), "Explorer server error, retrying");
                }
                Err(e) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(e);
                    }
                    warn!(attempt, error = %e, "Explorer request failed, retrying");
                }
            }
            tokio::time::sleep(self.backoff_for(attempt)).await;
        }
    }

    async fn send_once(&self, params: &[(&str, &str)]) -> Result<Attempt, ExplorerError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(params)
            .send()
            .await
            .map_err(|e| ExplorerError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Ok(Attempt::ServerError(status));
        }

        // Explorers do not always label JSON bodies correctly.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExplorerError::Request(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map(Attempt::Response)
            .map_err(|e| ExplorerError::Decode(e.to_string()))
    }

    fn backoff_for(&self, attempt: usize) -> Duration {
        self.backoff
            .get(attempt - 1)
            .or(self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}
