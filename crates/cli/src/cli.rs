// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tillq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline sale queue for a point-of-sale till")]
#[command(
    long_about = "Offline sale queue for a point-of-sale till.\n\n\
    Sales are sent to the sale server when it is reachable and stored locally when it is not. \
    Stored sales are replayed in order once the server is back."
)]
pub struct Cli {
    /// Directory holding the queue, config and log
    #[arg(long = "state-dir", global = true, value_name = "path")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Record a sale (sent now if online, queued otherwise)
    #[command(after_help = "\
Examples:
  tillq record --item A1:2 --total 40.00        Two units of A1
  tillq record --item A1 --item B7:3 --total 12  A bare SKU means one unit")]
    Record {
        /// Sale line as SKU:QTY (repeatable)
        #[arg(long = "item", short = 'i', value_name = "SKU:QTY", required = true)]
        items: Vec<String>,

        /// Sale total
        #[arg(long, short = 't')]
        total: f64,
    },

    /// List sales waiting to be synced
    List {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show queue and connectivity status
    Status {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Replay queued sales now
    Sync,

    /// End the session and drop every queued sale
    Logout,

    /// Keep syncing in the foreground until interrupted
    Run,

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
