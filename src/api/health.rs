// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::models::{HealthResponse, LiveResponse};
use crate::state::AppState;

/// Health check endpoint handler.
///
/// Always answers 200; the body reports whether the database is readable
/// and whether an explorer API key is configured.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = match state.db.blocking(|db| db.ping()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        db,
        etherscan_key: state.explorer.has_api_key(),
    })
}

/// Liveness probe handler.
///
/// Does not check dependencies.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = LiveResponse)
    )
)]
pub async fn liveness() -> Json<LiveResponse> {
    Json(LiveResponse {
        status: "ok".to_string(),
    })
}
