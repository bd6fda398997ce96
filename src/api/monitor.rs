// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Live wallet lookup straight from the explorer. Nothing is persisted.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, warn};

use crate::explorer::{known_network_by_chain, TxListOutcome};
use crate::models::{MonitorQuery, MonitorResponse};
use crate::normalizer::{is_valid_address, to_transaction_items};
use crate::state::AppState;

/// Short label of the monitored chain, e.g. `sepolia`.
fn network_label(chain_id: u64) -> String {
    known_network_by_chain(chain_id)
        .map(|n| n.short_name.to_string())
        .unwrap_or_else(|| chain_id.to_string())
}

/// Fetch and normalize a wallet's latest transactions.
///
/// Every outcome, including failures, is answered with the monitor envelope.
#[utoipa::path(
    get,
    path = "/monitor/wallet",
    tag = "Monitor",
    params(MonitorQuery),
    responses(
        (status = 200, description = "Newest transactions, at most 500", body = MonitorResponse),
        (status = 400, description = "Invalid address", body = MonitorResponse),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "Explorer unreachable or malformed", body = MonitorResponse),
        (status = 503, description = "Explorer refused the request", body = MonitorResponse)
    )
)]
pub async fn monitor_wallet(
    State(state): State<AppState>,
    Query(query): Query<MonitorQuery>,
) -> (StatusCode, Json<MonitorResponse>) {
    let address = query.address.unwrap_or_default();
    let chain_id = state.config.monitor_chain_id;
    let network = network_label(chain_id);
    let fail = |status: StatusCode| (status, Json(MonitorResponse::error(&address, &network)));

    if !is_valid_address(&address) {
        return fail(StatusCode::BAD_REQUEST);
    }

    let response = match state.explorer.get_txlist(&address, chain_id).await {
        Ok(response) => response,
        Err(e) => {
            error!(wallet = %address, error = %e, "etherscan_call_failed");
            return fail(StatusCode::BAD_GATEWAY);
        }
    };

    let raw = match response.outcome() {
        TxListOutcome::Transactions(raw) => raw,
        TxListOutcome::NoTransactions => Vec::new(),
        TxListOutcome::RateLimited(msg) => {
            warn!(wallet = %address, message = %msg, "etherscan_rate_limited");
            return fail(StatusCode::SERVICE_UNAVAILABLE);
        }
        TxListOutcome::Failed(msg) => {
            warn!(wallet = %address, message = %msg, "Explorer returned an error");
            return fail(StatusCode::SERVICE_UNAVAILABLE);
        }
        TxListOutcome::Malformed(msg) => {
            error!(wallet = %address, error = %msg, "Explorer returned malformed transactions");
            return fail(StatusCode::BAD_GATEWAY);
        }
    };

    let items = match to_transaction_items(&raw, &address) {
        Ok(items) => items,
        Err(e) => {
            error!(wallet = %address, error = %e, "Explorer returned malformed transactions");
            return fail(StatusCode::BAD_GATEWAY);
        }
    };

    info!(wallet = %address, count = items.len(), "monitor_wallet_success");
    (
        StatusCode::OK,
        Json(MonitorResponse::success(items, &address, &network)),
    )
}
