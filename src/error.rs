// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::explorer::ExplorerError;
use crate::storage::DbError;
use crate::sync::SyncError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            detail: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => Self::not_found(format!("{what} not found")),
            DbError::AlreadyExists(what) => Self::conflict(format!("{what} already registered")),
            other => {
                tracing::error!(error = %other, "Database error");
                Self::internal("database error")
            }
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Explorer(ExplorerError::InvalidBaseUrl(msg)) => {
                Self::internal(format!("explorer misconfigured: {msg}"))
            }
            SyncError::Explorer(e) => Self::bad_gateway(e.to_string()),
            SyncError::Malformed(_) | SyncError::Normalize(_) => Self::bad_gateway(err.to_string()),
            SyncError::RateLimited(_) | SyncError::Upstream(_) => {
                Self::service_unavailable(err.to_string())
            }
            SyncError::Database(e) => Self::from(e),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::unprocessable(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let conflict = ApiError::conflict("dup");
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let unp = ApiError::unprocessable("oops");
        assert_eq!(unp.status, StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(
            ApiError::too_many_requests("slow down").status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ApiError::bad_gateway("x").status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::service_unavailable("x").status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::internal("x").status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"detail":"bad data"}"#);
    }

    #[test]
    fn sync_errors_map_to_gateway_statuses() {
        let transport: ApiError =
            SyncError::Explorer(ExplorerError::Request("refused".into())).into();
        assert_eq!(transport.status, StatusCode::BAD_GATEWAY);

        let limited: ApiError = SyncError::RateLimited("Max rate limit reached".into()).into();
        assert_eq!(limited.status, StatusCode::SERVICE_UNAVAILABLE);

        let upstream: ApiError = SyncError::Upstream("NOTOK".into()).into();
        assert_eq!(upstream.status, StatusCode::SERVICE_UNAVAILABLE);

        let malformed: ApiError = SyncError::Malformed("bad list".into()).into();
        assert_eq!(malformed.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn db_errors_map_to_http_statuses() {
        let dup: ApiError = DbError::AlreadyExists("Wallet 0xabc".into()).into();
        assert_eq!(dup.status, StatusCode::CONFLICT);

        let missing: ApiError = DbError::NotFound("User 3".into()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let io: ApiError = DbError::Io(std::io::Error::other("disk")).into();
        assert_eq!(io.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(io.message, "database error");

        let task: ApiError = DbError::Task("worker panicked".into()).into();
        assert_eq!(task.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
