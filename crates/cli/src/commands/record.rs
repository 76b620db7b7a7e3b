// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tq_core::{SaleLine, SaleRequest};
use tq_sync::{LogSink, Recorded, SaleRecorder, SyncEvent};

use crate::error::{Error, Result};

use super::{runtime, Context};

/// Builds a sale from `SKU:QTY` arguments.
pub(crate) fn parse_sale(items: &[String], total: f64) -> Result<SaleRequest> {
    if items.is_empty() {
        return Err(Error::FieldRequired { field: "--item" });
    }
    let lines = items.iter().map(|s| SaleLine::parse(s)).collect::<tq_core::Result<Vec<_>>>()?;
    let sale = SaleRequest::new(lines, total);
    sale.validate()?;
    Ok(sale)
}

pub fn run(ctx: &Context, items: &[String], total: f64) -> Result<()> {
    let sale = parse_sale(items, total)?;
    let queue = ctx.open_queue()?;

    let recorded = runtime()?.block_on(async {
        let monitor = ctx.probe_monitor().await;
        let engine = ctx.engine(queue.clone(), monitor, Arc::new(LogSink));
        SaleRecorder::new(engine).record(sale).await
    })?;

    match recorded {
        Recorded::Sent(confirmation) => {
            println!("sale sent as {}", confirmation.record_id);
        }
        Recorded::Queued(id) => {
            println!("{}", SyncEvent::SaleQueued { id, pending: queue.len() }.summary());
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
