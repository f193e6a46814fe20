// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use joule_storage::StorageError;
use thiserror::Error;

/// Errors a request handler can surface.
///
/// Background job failures never travel this path: they land in the job's
/// `error` field and are reported via `/status` and the progress bus.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad payload, failed validation, or a conflicting operation (e.g.
    /// cancelling a terminal job). One message per problem.
    #[error("bad request: {}", .0.join("; "))]
    BadRequest(Vec<String>),

    #[error("not found: {0}")]
    NotFound(String),

    /// Programmer or infrastructure error; details go to logs, the client
    /// gets a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(vec![message.into()])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(errors) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "success": false, "errors": errors })),
            )
                .into_response(),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "success": false, "error": format!("not found: {what}") })),
            )
                .into_response(),
            ApiError::Internal(details) => {
                tracing::error!(details = %details, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "success": false, "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::PathEscape { path } => {
                ApiError::bad_request(format!("path escapes the project root: {path}"))
            }
            StorageError::NotFound { path } => ApiError::NotFound(path),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
