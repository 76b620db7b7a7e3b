// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the tillq CLI.

use thiserror::Error;

/// Errors surfaced by tillq commands.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Queue(#[from] tq_core::Error),

    #[error("remote error: {0}")]
    Api(#[from] tq_sync::ApiError),

    #[error("config error: {0}")]
    Config(String),

    #[error("{field} is required")]
    FieldRequired { field: &'static str },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tillq commands.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
