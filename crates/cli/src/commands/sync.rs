// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tq_sync::{DrainOutcome, LogSink, NotificationSink, SyncEvent, Trigger};

use crate::error::Result;

use super::{runtime, sales, Context};

/// Logs every event and echoes per-item problems to stderr.
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, event: SyncEvent) {
        if matches!(
            event,
            SyncEvent::ItemFailed { .. }
                | SyncEvent::ItemAbandoned { .. }
                | SyncEvent::PersistenceFailed { .. }
        ) {
            eprintln!("warning: {}", event.summary());
        }
        LogSink.notify(event);
    }
}

/// One line describing how a manual sync went.
pub(crate) fn describe(outcome: &DrainOutcome, pending: usize) -> String {
    match outcome {
        DrainOutcome::AlreadyDraining => "sync already running".to_string(),
        DrainOutcome::Offline if pending == 0 => "offline, nothing to sync".to_string(),
        DrainOutcome::Offline => format!("offline, {} pending sync", sales(pending)),
        DrainOutcome::Empty => "nothing to sync".to_string(),
        DrainOutcome::Completed(report) => SyncEvent::SyncFinished {
            synced: report.synced,
            failed: report.failed,
            pending: report.pending,
        }
        .summary(),
    }
}

pub fn run(ctx: &Context) -> Result<()> {
    let queue = ctx.open_queue()?;

    let outcome = runtime()?.block_on(async {
        let monitor = ctx.probe_monitor().await;
        let engine = ctx.engine(queue.clone(), monitor, Arc::new(ConsoleSink));
        engine.trigger(Trigger::Manual).await
    });

    println!("{}", describe(&outcome, queue.len()));
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
