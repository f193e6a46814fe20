// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error types.

use thiserror::Error;

/// Errors from the artifact store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The path resolves outside the project root. Hard invariant against
    /// directory traversal; no filesystem access happens for such paths.
    #[error("path escapes the project root: {path}")]
    PathEscape { path: String },

    #[error("artifact not found: {path}")]
    NotFound { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    pub fn is_path_escape(&self) -> bool {
        matches!(self, StorageError::PathEscape { .. })
    }
}

/// Errors from the TTL cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache keys must be non-empty")]
    InvalidKey,

    #[error("value is not serializable: {0}")]
    NotSerializable(#[source] serde_json::Error),
}
