// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::Serialize;
use tq_core::QueueItem;
use tq_sync::Connectivity;

use crate::cli::OutputFormat;
use crate::error::Result;

use super::{runtime, sales, Context};

/// Queue and connectivity at a glance.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusReport {
    pub remote: String,
    pub connectivity: String,
    pub pending: usize,
    pub failing: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
}

impl StatusReport {
    pub(crate) fn new(remote: &str, status: Connectivity, items: &[QueueItem]) -> Self {
        StatusReport {
            remote: remote.to_string(),
            connectivity: status.to_string(),
            pending: items.len(),
            failing: items.iter().filter(|i| i.has_failed()).count(),
            oldest: items.first().map(|i| i.enqueued_at),
        }
    }

    pub(crate) fn to_text(&self) -> String {
        let mut out = format!("remote: {} ({})\n", self.remote, self.connectivity);
        if self.pending == 0 {
            out.push_str("pending: none");
            return out;
        }
        out.push_str(&format!("pending: {}", sales(self.pending)));
        if self.failing > 0 {
            out.push_str(&format!(", {} failed at least once", self.failing));
        }
        if let Some(oldest) = self.oldest {
            out.push_str(&format!("\noldest: {}", oldest.format("%Y-%m-%d %H:%M:%S")));
        }
        out
    }
}

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let items = ctx.open_queue()?.list();
    let status = runtime()?.block_on(ctx.probe_monitor()).current_status();
    let report = StatusReport::new(&ctx.config.remote.url, status, &items);

    match output {
        OutputFormat::Text => println!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
