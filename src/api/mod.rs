// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        HealthResponse, LiveResponse, Metadata, MonitorResponse, RegisterWalletRequest,
        RegisterWalletResponse, ResponseStatus, TransactionPage, TransactionRecord,
        WalletInfoResponse, WalletSummary,
    },
    normalizer::TransactionItem,
    rate_limit::rate_limit,
    state::AppState,
    storage::{Direction, SyncStatus, TxStatus},
    sync::SyncSummary,
    telemetry::log_request_timing,
};

pub mod extract;
pub mod health;
pub mod monitor;
pub mod transactions;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let limited = Router::new()
        .route("/monitor/wallet", get(monitor::monitor_wallet))
        .route_layer(from_fn_with_state(state.limiter.clone(), rate_limit));

    let api = Router::new()
        .merge(limited)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/wallet/register", post(wallets::register_wallet))
        .route("/wallet/{address}", get(wallets::get_wallet_info))
        .route("/wallet/{address}/sync", post(wallets::sync_wallet))
        .route(
            "/wallet/{address}/transactions",
            get(transactions::list_wallet_transactions),
        )
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(from_fn(log_request_timing))
                .layer(CorsLayer::permissive()),
        )
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Wallet Monitor", description = "Ethereum wallet transaction monitor"),
    paths(
        health::health,
        health::liveness,
        monitor::monitor_wallet,
        wallets::register_wallet,
        wallets::get_wallet_info,
        wallets::sync_wallet,
        transactions::list_wallet_transactions
    ),
    components(
        schemas(
            HealthResponse,
            LiveResponse,
            MonitorResponse,
            Metadata,
            ResponseStatus,
            TransactionItem,
            RegisterWalletRequest,
            RegisterWalletResponse,
            WalletSummary,
            WalletInfoResponse,
            TransactionPage,
            TransactionRecord,
            SyncSummary,
            Direction,
            TxStatus,
            SyncStatus
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Monitor", description = "Live explorer lookups"),
        (name = "Wallets", description = "Wallet registration and sync"),
        (name = "Transactions", description = "Stored transaction history")
    )
)]
pub struct ApiDoc;
