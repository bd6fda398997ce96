// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-client request limiting.
//!
//! Fixed one-minute windows keyed by client IP. The key is the socket peer
//! address when the server runs with `ConnectInfo`, otherwise the first
//! `x-forwarded-for` entry, otherwise `"unknown"`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

const WINDOW: Duration = Duration::from_secs(60);

/// Map size at which expired windows are swept.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// A limit of 0 disables limiting.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, WINDOW)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Human-readable limit, e.g. `5/minute`.
    pub fn describe(&self) -> String {
        if self.window == WINDOW {
            format!("{}/minute", self.limit)
        } else {
            format!("{}/{}s", self.limit, self.window.as_secs())
        }
    }

    /// Count a request for `key`. Returns `false` once the window is exhausted.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if self.limit == 0 {
            return true;
        }

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.limit {
            return false;
        }
        entry.count += 1;
        true
    }
}

/// Identify the client a request should be counted against.
pub fn client_key(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(addr) = peer {
        return addr.ip().to_string();
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware rejecting requests over the limit with 429.
///
/// ```rust,ignore
/// Router::new()
///     .route("/monitor/wallet", get(monitor_wallet))
///     .route_layer(from_fn_with_state(limiter, rate_limit));
/// ```
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(peer, request.headers());

    if !limiter.check(&key) {
        tracing::warn!(client = %key, limit = %limiter.describe(), "Rate limit exceeded");
        return ApiError::too_many_requests(format!(
            "rate limit exceeded: {}",
            limiter.describe()
        ))
        .into_response();
    }

    next.run(request).await
}
