// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet Monitor - Ethereum wallet transaction tracker
//!
//! Registers wallet addresses, pulls their transaction history from an
//! Etherscan-compatible explorer, and serves it back newest first.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `explorer` - Etherscan client and wire types
//! - `normalizer` - Raw explorer records to typed transactions
//! - `sync` - Fetch, dedupe and persist a wallet's transactions
//! - `storage` - Embedded redb database

pub mod api;
pub mod config;
pub mod error;
pub mod explorer;
pub mod models;
pub mod normalizer;
pub mod rate_limit;
pub mod state;
pub mod storage;
pub mod sync;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;
