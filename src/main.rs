// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing::{error, info};

use wallet_monitor::{
    api::router,
    config::{AppConfig, LogFormat},
    explorer::KNOWN_NETWORKS,
    state::AppState,
    storage::{NewNetwork, WalletDatabase},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(LogFormat::from_env());

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = WalletDatabase::open(&config.database_path)?;
    for network in &KNOWN_NETWORKS {
        db.ensure_network(NewNetwork::from(network))?;
    }
    info!(path = %config.database_path.display(), "Database ready");

    let bind_addr = config.bind_addr();
    let rate_limit = config.rate_limit_str();
    let state = AppState::new(config, db)?;
    let explorer_url = state.explorer.base_url().to_string();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        rate_limit = %rate_limit,
        explorer = %explorer_url,
        "Service started (docs at /docs)"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
