// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Explorer wire types and network constants.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Etherscan v2 multichain endpoint.
pub const DEFAULT_EXPLORER_URL: &str = "https://api.etherscan.io/v2/api";

/// Network used when a registration does not name one.
pub const DEFAULT_NETWORK: &str = "sepolia-testnet";

/// Static description of an EVM network the explorer can be queried for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Registration key, e.g. `sepolia-testnet`
    pub name: &'static str,
    /// Short label used in monitor responses
    pub short_name: &'static str,
    /// Chain ID passed to the explorer as `chainid`
    pub chain_id: u64,
    /// Native token symbol
    pub symbol: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

pub const ETHEREUM_MAINNET: NetworkConfig = NetworkConfig {
    name: "ethereum-mainnet",
    short_name: "mainnet",
    chain_id: 1,
    symbol: "ETH",
    explorer_url: "https://etherscan.io",
};

pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "sepolia-testnet",
    short_name: "sepolia",
    chain_id: 11_155_111,
    symbol: "ETH",
    explorer_url: "https://sepolia.etherscan.io",
};

pub const GOERLI: NetworkConfig = NetworkConfig {
    name: "goerli-testnet",
    short_name: "goerli",
    chain_id: 5,
    symbol: "ETH",
    explorer_url: "https://goerli.etherscan.io",
};

/// Networks seeded into the database at startup.
pub static KNOWN_NETWORKS: [NetworkConfig; 3] = [ETHEREUM_MAINNET, SEPOLIA, GOERLI];

/// Look up a known network by its registration name (case-insensitive).
pub fn known_network(name: &str) -> Option<&'static NetworkConfig> {
    let name = name.trim();
    KNOWN_NETWORKS
        .iter()
        .find(|n| n.name.eq_ignore_ascii_case(name))
}

/// Look up a known network by chain ID.
pub fn known_network_by_chain(chain_id: u64) -> Option<&'static NetworkConfig> {
    KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// A transaction as returned by `account/txlist`.
///
/// Every field is string-typed on the wire and may be absent; numeric
/// values are tolerated and kept in their decimal string form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExplorerTx {
    #[serde(default, deserialize_with = "lenient_string")]
    pub hash: Option<String>,
    #[serde(rename = "blockNumber", default, deserialize_with = "lenient_string")]
    pub block_number: Option<String>,
    #[serde(rename = "timeStamp", default, deserialize_with = "lenient_string")]
    pub time_stamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(rename = "gasUsed", default, deserialize_with = "lenient_string")]
    pub gas_used: Option<String>,
    #[serde(rename = "isError", default, deserialize_with = "lenient_string")]
    pub is_error: Option<String>,
}

/// Envelope of every explorer response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxListResponse {
    /// `"1"` on success, `"0"` otherwise (some proxies send a number)
    #[serde(default, deserialize_with = "status_string")]
    pub status: String,
    #[serde(default)]
    pub message: String,
    /// A list of transactions on success, an error string otherwise
    #[serde(default)]
    pub result: Value,
}

/// What a txlist response means for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum TxListOutcome {
    Transactions(Vec<RawExplorerTx>),
    NoTransactions,
    RateLimited(String),
    Failed(String),
    Malformed(String),
}

impl TxListResponse {
    /// Synthetic response returned once server errors exhaust the retries.
    pub fn server_error() -> Self {
        Self {
            status: "0".to_string(),
            message: "SERVER_ERROR".to_string(),
            result: Value::Array(Vec::new()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Error text: the message, or the result when the message is empty.
    pub fn error_message(&self) -> String {
        if !self.message.is_empty() {
            return self.message.clone();
        }
        match &self.result {
            Value::String(s) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn outcome(&self) -> TxListOutcome {
        if self.is_ok() {
            return match &self.result {
                Value::Array(_) => match serde_json::from_value(self.result.clone()) {
                    Ok(txs) => TxListOutcome::Transactions(txs),
                    Err(e) => TxListOutcome::Malformed(e.to_string()),
                },
                _ => TxListOutcome::Transactions(Vec::new()),
            };
        }

        let message = self.error_message();
        let detail = match &self.result {
            Value::String(s) => s.as_str(),
            _ => "",
        };

        if message.contains("No transactions found") {
            TxListOutcome::NoTransactions
        } else if message.contains("Max rate limit") || detail.contains("Max rate limit") {
            TxListOutcome::RateLimited(if detail.is_empty() {
                message
            } else {
                detail.to_string()
            })
        } else {
            TxListOutcome::Failed(message)
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    })
}

fn status_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}
