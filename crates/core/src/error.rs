// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tq-core operations.

use thiserror::Error;

/// All possible errors that can occur in tq-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not persist queue: {0}\n  hint: the sale was NOT queued, record it again once storage is writable")]
    Persistence(String),

    #[error("queue '{0}' is in use by another process\n  hint: stop the other tillq process or pick a different namespace")]
    Locked(String),

    #[error("corrupted queue data: {0}")]
    Corrupted(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tq-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
