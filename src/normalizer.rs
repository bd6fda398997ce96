// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Raw explorer records to typed transaction items.
//!
//! Everything here is pure: no I/O, no clock.

use alloy::primitives::U256;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::explorer::RawExplorerTx;
use crate::storage::{Direction, NewTransaction, TxStatus};

/// Most transactions a single monitor response or sync will carry.
pub const MAX_TRANSACTIONS: usize = 500;

/// Wei per ether, as a decimal exponent.
const ETH_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("field `{field}` is not a valid number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// One normalized transaction as exposed by the monitor endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionItem {
    pub tx_hash: String,
    pub block_number: u64,
    #[schema(value_type = String, example = "2025-11-27T12:00:00Z")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "from")]
    pub from_address: String,
    #[serde(rename = "to")]
    pub to_address: String,
    pub value_eth: f64,
    pub status: TxStatus,
    pub gas_used: u64,
}

/// `0x` followed by exactly 40 hex digits, either case.
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Unix seconds to a UTC instant.
pub fn parse_timestamp(seconds: i64) -> Result<DateTime<Utc>, NormalizeError> {
    DateTime::from_timestamp(seconds, 0).ok_or(NormalizeError::TimestampOutOfRange(seconds))
}

/// Unix seconds to RFC 3339 with a `Z` suffix, e.g. `2023-11-14T22:13:20Z`.
pub fn to_iso(seconds: i64) -> Result<String, NormalizeError> {
    Ok(parse_timestamp(seconds)?.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Decimal wei string to ETH.
///
/// The value is parsed as a 256-bit integer and rendered as an exact
/// 18-decimal string before the final float conversion, so large balances
/// do not lose precision through intermediate arithmetic.
pub fn wei_to_eth(value: &str) -> Result<f64, NormalizeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    let wei = U256::from_str_radix(value, 10).map_err(|_| NormalizeError::InvalidNumber {
        field: "value",
        value: value.to_string(),
    })?;

    format_ether(wei)
        .parse::<f64>()
        .map_err(|_| NormalizeError::InvalidNumber {
            field: "value",
            value: value.to_string(),
        })
}

/// Exact decimal rendering of a wei amount in ETH.
fn format_ether(wei: U256) -> String {
    if wei.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(ETH_DECIMALS));
    let whole = wei / divisor;
    let remainder = wei % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", remainder, width = ETH_DECIMALS as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

fn parse_u64(field: &'static str, value: Option<&str>) -> Result<u64, NormalizeError> {
    match value.map(str::trim) {
        None | Some("") => Ok(0),
        Some(v) => v.parse().map_err(|_| NormalizeError::InvalidNumber {
            field,
            value: v.to_string(),
        }),
    }
}

fn parse_i64(field: &'static str, value: Option<&str>) -> Result<i64, NormalizeError> {
    match value.map(str::trim) {
        None | Some("") => Ok(0),
        Some(v) => v.parse().map_err(|_| NormalizeError::InvalidNumber {
            field,
            value: v.to_string(),
        }),
    }
}

/// Sort key for newest-first ordering; unparsable timestamps sort as 0.
fn sort_key(tx: &RawExplorerTx) -> i64 {
    parse_i64("timeStamp", tx.time_stamp.as_deref()).unwrap_or(0)
}

fn to_item(tx: &RawExplorerTx) -> Result<TransactionItem, NormalizeError> {
    let is_error = tx.is_error.as_deref().map(str::trim).unwrap_or("0");
    let status = if is_error == "0" {
        TxStatus::Success
    } else {
        TxStatus::Failed
    };

    Ok(TransactionItem {
        tx_hash: tx.hash.clone().unwrap_or_default(),
        block_number: parse_u64("blockNumber", tx.block_number.as_deref())?,
        timestamp: parse_timestamp(parse_i64("timeStamp", tx.time_stamp.as_deref())?)?,
        from_address: tx.from.clone().unwrap_or_default(),
        to_address: tx.to.clone().unwrap_or_default(),
        value_eth: wei_to_eth(tx.value.as_deref().unwrap_or("0"))?,
        status,
        gas_used: parse_u64("gasUsed", tx.gas_used.as_deref())?,
    })
}

/// Normalize a raw explorer list: newest first, at most [`MAX_TRANSACTIONS`].
///
/// The sort is stable, so records sharing a timestamp keep their input order.
/// `wallet` is accepted for symmetry with [`to_db_row`]; items carry no
/// wallet-relative fields.
pub fn to_transaction_items(
    raw: &[RawExplorerTx],
    _wallet: &str,
) -> Result<Vec<TransactionItem>, NormalizeError> {
    let mut sorted: Vec<&RawExplorerTx> = raw.iter().collect();
    sorted.sort_by_key(|tx| std::cmp::Reverse(sort_key(tx)));

    sorted
        .into_iter()
        .take(MAX_TRANSACTIONS)
        .map(to_item)
        .collect()
}

/// Direction of a transfer relative to `wallet`, compared case-insensitively.
pub fn direction(wallet: &str, from: &str, to: &str) -> Direction {
    let is_from = from.eq_ignore_ascii_case(wallet);
    let is_to = to.eq_ignore_ascii_case(wallet);
    match (is_from, is_to) {
        (true, true) => Direction::SelfTransfer,
        (true, false) => Direction::Out,
        (false, true) => Direction::In,
        // Unrelated transfers are filed as self
        (false, false) => Direction::SelfTransfer,
    }
}

/// Build the persisted row for an item. Fees are not tracked yet and stay 0.
pub fn to_db_row(
    item: &TransactionItem,
    wallet_id: u64,
    network_id: u64,
    wallet_address: &str,
) -> NewTransaction {
    NewTransaction {
        network_id,
        wallet_id,
        tx_hash: item.tx_hash.clone(),
        block_number: item.block_number,
        time_stamp: item.timestamp,
        from_address: item.from_address.clone(),
        to_address: item.to_address.clone(),
        value_eth: item.value_eth,
        gas_used: item.gas_used,
        tx_fee_eth: 0.0,
        direction: direction(wallet_address, &item.from_address, &item.to_address),
        status: item.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{raw_tx, OTHER, WALLET};

    fn raw(ts: i64, value_wei: u128, is_error: &str) -> RawExplorerTx {
        serde_json::from_value(raw_tx(ts, value_wei, is_error)).unwrap()
    }

    // -------------------------------------------------------------------------
    // Address validation
    // -------------------------------------------------------------------------

    #[test]
    fn valid_addresses() {
        assert!(is_valid_address(&format!("0x{}", "a".repeat(40))));
        assert!(is_valid_address(&format!("0x{}", "A".repeat(40))));
        assert!(is_valid_address("0x1234567890abcdef1234567890abcdef12345678"));
    }

    #[test]
    fn invalid_address_prefix() {
        assert!(!is_valid_address(&format!("1x{}", "a".repeat(40))));
        assert!(!is_valid_address(&format!("0X{}", "a".repeat(40))));
    }

    #[test]
    fn invalid_address_length() {
        assert!(!is_valid_address(&format!("0x{}", "a".repeat(39))));
        assert!(!is_valid_address(&format!("0x{}", "a".repeat(41))));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn invalid_address_chars() {
        assert!(!is_valid_address(&format!("0x{}", "z".repeat(40))));
        assert!(!is_valid_address(&format!(" 0x{}", "a".repeat(40))));
    }

    // -------------------------------------------------------------------------
    // Conversions
    // -------------------------------------------------------------------------

    #[test]
    fn iso_timestamps_use_z_suffix() {
        assert_eq!(to_iso(0).unwrap(), "1970-01-01T00:00:00Z");
        assert_eq!(to_iso(1_700_000_000).unwrap(), "2023-11-14T22:13:20Z");
        assert!(to_iso(i64::MAX).is_err());
    }

    #[test]
    fn wei_conversion() {
        assert_eq!(wei_to_eth("1000000000000000000").unwrap(), 1.0);
        assert_eq!(wei_to_eth("500000000000000000").unwrap(), 0.5);
        assert_eq!(wei_to_eth("0").unwrap(), 0.0);
        assert_eq!(wei_to_eth("").unwrap(), 0.0);
        assert_eq!(wei_to_eth("12122025000000").unwrap(), 0.000012122025);
        assert!(wei_to_eth("-1").is_err());
        assert!(wei_to_eth("0x10").is_err());
    }

    #[test]
    fn wei_conversion_handles_values_beyond_u128() {
        let huge = format!("1{}", "0".repeat(60));
        assert_eq!(wei_to_eth(&huge).unwrap(), 1e42);
    }

    #[test]
    fn format_ether_is_exact() {
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
        assert_eq!(
            format_ether(U256::from(1_234_500_000_000_000_000u128)),
            "1.2345"
        );
        assert_eq!(format_ether(U256::from(3_000_000_000_000_000_000u128)), "3");
    }

    // -------------------------------------------------------------------------
    // Transformation
    // -------------------------------------------------------------------------

    #[test]
    fn transform_sorts_newest_first() {
        let items: Vec<_> = (1..=60).map(|ts| raw(ts, ts as u128 * 10, "0")).collect();
        let res = to_transaction_items(&items, WALLET).unwrap();
        assert_eq!(res.len(), 60);
        assert!(res[0].block_number > res[59].block_number);
        assert_eq!(res[0].tx_hash, "0x3c");
    }

    #[test]
    fn transform_keeps_at_most_500() {
        let items: Vec<_> = (1..=600).map(|ts| raw(ts, 10, "0")).collect();
        let res = to_transaction_items(&items, WALLET).unwrap();
        assert_eq!(res.len(), MAX_TRANSACTIONS);
        // The 100 oldest are the ones dropped
        assert_eq!(res.last().unwrap().block_number, 100_101);
    }

    #[test]
    fn transform_maps_value_and_status() {
        let items = vec![
            raw(99, 500_000_000_000_000_000, "1"),
            raw(100, 1_000_000_000_000_000_000, "0"),
        ];
        let res = to_transaction_items(&items, WALLET).unwrap();
        assert_eq!(res[0].value_eth, 1.0);
        assert_eq!(res[0].status, TxStatus::Success);
        assert_eq!(res[1].value_eth, 0.5);
        assert_eq!(res[1].status, TxStatus::Failed);
        assert_eq!(res[1].gas_used, 21_000);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let res = to_transaction_items(&[RawExplorerTx::default()], WALLET).unwrap();
        let item = &res[0];
        assert_eq!(item.tx_hash, "");
        assert_eq!(item.block_number, 0);
        assert_eq!(item.timestamp, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(item.from_address, "");
        assert_eq!(item.to_address, "");
        assert_eq!(item.value_eth, 0.0);
        assert_eq!(item.status, TxStatus::Success);
        assert_eq!(item.gas_used, 0);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let mut a = raw(5, 1, "0");
        a.hash = Some("0xfirst".to_string());
        let mut b = raw(5, 1, "0");
        b.hash = Some("0xsecond".to_string());
        let res = to_transaction_items(&[a, b], WALLET).unwrap();
        assert_eq!(res[0].tx_hash, "0xfirst");
        assert_eq!(res[1].tx_hash, "0xsecond");
    }

    #[test]
    fn non_numeric_field_is_an_error() {
        let mut bad = raw(1, 1, "0");
        bad.gas_used = Some("lots".to_string());
        let err = to_transaction_items(&[bad], WALLET).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::InvalidNumber {
                field: "gasUsed",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn item_serializes_from_and_to() {
        let res = to_transaction_items(&[raw(1_700_000_000, 0, "0")], WALLET).unwrap();
        let json = serde_json::to_value(&res[0]).unwrap();
        assert_eq!(json["from"], WALLET);
        assert_eq!(json["to"], OTHER);
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
        assert_eq!(json["status"], "success");
        assert!(json.get("from_address").is_none());
    }

    // -------------------------------------------------------------------------
    // Direction and DB rows
    // -------------------------------------------------------------------------

    #[test]
    fn direction_is_case_insensitive() {
        let upper = WALLET.to_uppercase().replacen("0X", "0x", 1);
        assert_eq!(direction(WALLET, &upper, OTHER), Direction::Out);
        assert_eq!(direction(&upper, OTHER, WALLET), Direction::In);
        assert_eq!(direction(WALLET, WALLET, &upper), Direction::SelfTransfer);
        assert_eq!(direction(WALLET, OTHER, OTHER), Direction::SelfTransfer);
    }

    #[test]
    fn db_row_derives_direction_and_zero_fee() {
        let items = to_transaction_items(&[raw(42, 1_000, "1")], WALLET).unwrap();
        let row = to_db_row(&items[0], 7, 2, &WALLET.to_uppercase());
        assert_eq!(row.wallet_id, 7);
        assert_eq!(row.network_id, 2);
        assert_eq!(row.direction, Direction::Out);
        assert_eq!(row.tx_fee_eth, 0.0);
        assert_eq!(row.status, TxStatus::Failed);
        assert_eq!(row.time_stamp.timestamp(), 42);
    }
}
