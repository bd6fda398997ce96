// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Block-explorer integration (Etherscan v2 compatible).
//!
//! This module provides:
//! - The known network table used when registering wallets
//! - Wire types for the `account/txlist` endpoint
//! - An HTTP client with bounded retry

pub mod client;
pub mod types;

pub use client::{EtherscanClient, ExplorerError};
pub use types::*;
