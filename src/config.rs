// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and carried in
//! [`AppState`](crate::state::AppState) from then on.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ETHERSCAN_API_KEY` | Explorer API key | Required |
//! | `ETHERSCAN_BASE_URL` | Explorer endpoint | `https://api.etherscan.io/v2/api` |
//! | `MONITOR_CHAIN_ID` | Chain used by the live monitor endpoint | `11155111` |
//! | `DATABASE_PATH` | redb database file | `./data/wallet-monitor.redb` |
//! | `RATE_LIMIT` | Requests per minute per client on limited routes | `5` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter (falls back to `LOG_LEVEL`) | `info,tower_http=debug` |

use std::{env, path::PathBuf, str::FromStr};

use crate::explorer::{DEFAULT_EXPLORER_URL, SEPOLIA};

pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const ETHERSCAN_BASE_URL_ENV: &str = "ETHERSCAN_BASE_URL";
pub const MONITOR_CHAIN_ID_ENV: &str = "MONITOR_CHAIN_ID";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const RATE_LIMIT_ENV: &str = "RATE_LIMIT";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_DATABASE_PATH: &str = "./data/wallet-monitor.redb";
const DEFAULT_RATE_LIMIT: u32 = 5;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var(LOG_FORMAT_ENV) {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub etherscan_api_key: String,
    pub etherscan_base_url: String,
    pub monitor_chain_id: u64,
    pub database_path: PathBuf,
    /// Requests per minute per client.
    pub rate_limit: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let etherscan_api_key = env::var(ETHERSCAN_API_KEY_ENV)
            .map_err(|_| ConfigError::Missing(ETHERSCAN_API_KEY_ENV))?;

        Ok(Self {
            etherscan_api_key,
            etherscan_base_url: env::var(ETHERSCAN_BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_EXPLORER_URL.to_string()),
            monitor_chain_id: parse_env(MONITOR_CHAIN_ID_ENV, SEPOLIA.chain_id)?,
            database_path: env::var(DATABASE_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH)),
            rate_limit: parse_env(RATE_LIMIT_ENV, DEFAULT_RATE_LIMIT)?,
            host: env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_env(PORT_ENV, DEFAULT_PORT)?,
        })
    }

    /// Human-readable limit, e.g. `5/minute`.
    pub fn rate_limit_str(&self) -> String {
        format!("{}/minute", self.rate_limit)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            etherscan_api_key: String::new(),
            etherscan_base_url: DEFAULT_EXPLORER_URL.to_string(),
            monitor_chain_id: SEPOLIA.chain_id,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            rate_limit: DEFAULT_RATE_LIMIT,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_renders_per_minute() {
        let config = AppConfig {
            rate_limit: 7,
            ..AppConfig::default()
        };
        assert_eq!(config.rate_limit_str(), "7/minute");
    }

    #[test]
    fn parse_value_accepts_numbers_with_whitespace() {
        let port: u16 = parse_value(PORT_ENV, " 9000 ").unwrap();
        assert_eq!(port, 9000);
    }

    #[test]
    fn parse_value_rejects_garbage() {
        let err = parse_value::<u32>(RATE_LIMIT_ENV, "five").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: RATE_LIMIT_ENV, .. }
        ));
    }

    #[test]
    fn defaults_point_at_sepolia() {
        let config = AppConfig::default();
        assert_eq!(config.monitor_chain_id, 11_155_111);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
