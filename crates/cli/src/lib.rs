// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tillq - offline sale queue for a point-of-sale till.
//!
//! This crate provides the `tillq` CLI. Sales recorded while the sale server
//! is unreachable are stored in a durable queue under the state directory and
//! replayed in order, each with its own idempotency key, once connectivity
//! returns.
//!
//! # Main Components
//!
//! - [`Cli`] / [`Command`] - argument parsing
//! - [`Config`] - `config.toml` under the state directory
//! - [`Error`] - error type for all commands
//!
//! The queue itself lives in `tq-core` and the sync engine in `tq-sync`.

mod cli;
mod commands;
mod logging;

pub mod config;
pub mod env;
pub mod error;

pub use cli::{Cli, Command, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};

use commands::Context;

/// Execute a parsed command line. Resolves the state directory, installs
/// logging, loads config, then dispatches.
pub fn run(cli: Cli) -> Result<()> {
    let state_dir = config::resolve_state_dir(cli.state_dir, env::state_dir());
    logging::setup_logging(&config::log_path(&state_dir));
    let ctx = Context::load(state_dir)?;

    tracing::debug!(command = ?cli.command, "running");
    match cli.command {
        Command::Record { items, total } => commands::record::run(&ctx, &items, total),
        Command::List { output } => commands::list::run(&ctx, output),
        Command::Status { output } => commands::status::run(&ctx, output),
        Command::Sync => commands::sync::run(&ctx),
        Command::Logout => commands::logout::run(&ctx),
        Command::Run => commands::run::run(&ctx),
        Command::Config => commands::config::run(&ctx),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
