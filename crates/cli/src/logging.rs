// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Log setup for the tillq binary.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Sends logs to `log_path`, or stderr if the file cannot be opened.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Stdout stays
/// reserved for command output.
pub fn setup_logging(log_path: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(dir) = log_path.parent() {
        let _ = fs::create_dir_all(dir);
    }

    // Try to open log file, fall back to stderr
    let installed = if let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(log_path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };

    // Only fails if a subscriber is already set, which is fine
    let _ = installed;
}
