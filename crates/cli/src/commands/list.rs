// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tq_core::{QueueItem, SaleRequest};

use crate::cli::OutputFormat;
use crate::error::Result;

use super::Context;

/// One text line per queued item.
pub(crate) fn format_item(item: &QueueItem) -> String {
    let when = item.enqueued_at.format("%Y-%m-%d %H:%M:%S");
    let body = match serde_json::from_value::<SaleRequest>(item.payload.clone()) {
        Ok(sale) => {
            let lines: Vec<String> =
                sale.items.iter().map(|l| format!("{}x{}", l.qty, l.sku)).collect();
            format!("{} total {:.2}", lines.join(" "), sale.total)
        }
        Err(_) => item.payload.to_string(),
    };
    let mut line = format!("{} {} {} {}", item.id, item.kind.display_name(), when, body);
    if let Some(err) = &item.last_error {
        line.push_str(&format!(" [{} failed: {}]", item.attempts, err));
    }
    line
}

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let items = ctx.open_queue()?.list();
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Text if items.is_empty() => println!("No sales pending sync."),
        OutputFormat::Text => {
            for item in &items {
                println!("{}", format_item(item));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
