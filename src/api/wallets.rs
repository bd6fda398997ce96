// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet registration, info and manual sync endpoints.
//!
//! Registered wallets are keyed by `(network, lowercase address)`. Lookups
//! without a `network` query parameter resolve to the wallet on the network
//! with the lowest id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::extract::{ApiJson, ApiQuery};
use crate::{
    error::ApiError,
    explorer::{known_network, DEFAULT_NETWORK},
    models::{
        NetworkQuery, PageQuery, RegisterWalletRequest, RegisterWalletResponse,
        TransactionPage, WalletInfoResponse, WalletSummary,
    },
    normalizer::is_valid_address,
    state::AppState,
    storage::{Network, NewNetwork, NewWallet, Wallet, WalletDatabase},
    sync::{self, SyncSummary},
};

pub const INVALID_ADDRESS: &str =
    "invalid Ethereum address (must be 0x-prefixed and 42 characters)";

/// Trim and validate a wallet address taken from a path or body.
pub(crate) fn validate_address(raw: &str) -> Result<String, ApiError> {
    let address = raw.trim();
    if !is_valid_address(address) {
        return Err(ApiError::bad_request(INVALID_ADDRESS));
    }
    Ok(address.to_string())
}

/// Find a registered wallet and its network, or 404.
pub(crate) fn resolve_wallet(
    db: &WalletDatabase,
    address: &str,
    network: Option<&str>,
) -> Result<(Wallet, Network), ApiError> {
    let address = validate_address(address)?;

    let wallet = match network.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => {
            let network = db
                .network_by_name(name)?
                .ok_or_else(|| ApiError::bad_request(format!("unknown network: {name}")))?;
            db.find_wallet(network.network_id, &address)?
        }
        None => db.find_wallet_by_address(&address)?,
    }
    .ok_or_else(|| ApiError::not_found("wallet not found"))?;

    let network = db
        .get_network(wallet.network_id)?
        .ok_or_else(|| ApiError::internal("network data not found"))?;

    Ok((wallet, network))
}

/// Register a wallet and run its first sync.
///
/// The wallet stays registered when the sync fails; the failure is reported
/// in the `sync` field.
#[utoipa::path(
    post,
    path = "/wallet/register",
    tag = "Wallets",
    request_body = RegisterWalletRequest,
    responses(
        (status = 201, description = "Wallet registered", body = RegisterWalletResponse),
        (status = 400, description = "Invalid address, network or owner"),
        (status = 409, description = "Wallet already registered on this network")
    )
)]
pub async fn register_wallet(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterWalletRequest>,
) -> Result<(StatusCode, Json<RegisterWalletResponse>), ApiError> {
    let address = validate_address(&request.address)?;

    let network_name = request
        .network
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_NETWORK);
    let known = known_network(network_name)
        .ok_or_else(|| ApiError::bad_request(format!("unknown network: {network_name}")))?;

    let owner_name = request.owner_name.trim();
    if owner_name.is_empty() {
        return Err(ApiError::bad_request("owner_name must not be empty"));
    }

    let owner_name = owner_name.to_string();
    let label = request.label;
    let (network, owner, wallet) = state
        .db
        .blocking(move |db| {
            let network = db.ensure_network(NewNetwork::from(known))?;
            let owner = db.get_or_create_user(&owner_name)?;
            let wallet = db.create_wallet(NewWallet {
                user_id: owner.user_id,
                network_id: network.network_id,
                address,
                label,
            })?;
            Ok::<_, ApiError>((network, owner, wallet))
        })
        .await?;

    info!(
        wallet_id = wallet.wallet_id,
        address = %wallet.address,
        network = %network.name,
        owner = %owner.name,
        "Wallet registered"
    );

    let summary = match sync::sync_wallet(&state.db, &state.explorer, &wallet, &network).await {
        Ok(summary) => summary,
        Err(e) => SyncSummary::failed(e.to_string()),
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterWalletResponse {
            wallet: WalletSummary::new(&wallet, Some(&owner), &network),
            sync: summary,
        }),
    ))
}

/// Wallet details with the first page of its stored transactions.
#[utoipa::path(
    get,
    path = "/wallet/{address}",
    tag = "Wallets",
    params(
        ("address" = String, Path, description = "Wallet address"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Wallet and its transactions", body = WalletInfoResponse),
        (status = 400, description = "Invalid address"),
        (status = 404, description = "Wallet not registered"),
        (status = 422, description = "Invalid pagination")
    )
)]
pub async fn get_wallet_info(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<WalletInfoResponse>, ApiError> {
    let (page, page_size) = query.resolve()?;

    let (wallet, network, owner, transactions) = state
        .db
        .blocking(move |db| {
            let (wallet, network) = resolve_wallet(db, &address, query.network.as_deref())?;
            let owner = db.get_user(wallet.user_id)?;
            let transactions = db.list_transactions(wallet.wallet_id, page, page_size)?;
            Ok::<_, ApiError>((wallet, network, owner, transactions))
        })
        .await?;

    Ok(Json(WalletInfoResponse {
        wallet: WalletSummary::new(&wallet, owner.as_ref(), &network),
        transactions: TransactionPage::from(transactions),
    }))
}

/// Re-fetch a registered wallet's transactions from the explorer.
#[utoipa::path(
    post,
    path = "/wallet/{address}/sync",
    tag = "Wallets",
    params(
        ("address" = String, Path, description = "Wallet address"),
        NetworkQuery
    ),
    responses(
        (status = 200, description = "Sync completed", body = SyncSummary),
        (status = 404, description = "Wallet not registered"),
        (status = 502, description = "Explorer unreachable or returned malformed data"),
        (status = 503, description = "Explorer refused the request")
    )
)]
pub async fn sync_wallet(
    State(state): State<AppState>,
    Path(address): Path<String>,
    ApiQuery(query): ApiQuery<NetworkQuery>,
) -> Result<Json<SyncSummary>, ApiError> {
    let (wallet, network) = state
        .db
        .blocking(move |db| resolve_wallet(db, &address, query.network.as_deref()))
        .await?;
    let summary = sync::sync_wallet(&state.db, &state.explorer, &wallet, &network).await?;
    Ok(Json(summary))
}
