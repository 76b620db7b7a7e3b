// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground sync loop.
//!
//! Watches reachability of the sale server, replays queued sales whenever
//! it comes back, and prints each sync event. Pressing Enter asks for an
//! immediate sync; Ctrl-C stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tq_sync::{ChannelSink, ReachabilityProbe, SyncHandle, SyncService};

use crate::error::Result;

use super::{runtime, sales, Context};

const EVENT_CAPACITY: usize = 64;

/// Stdin may still be blocked in a read when the loop ends.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

pub fn run(ctx: &Context) -> Result<()> {
    let queue = ctx.open_queue()?;
    let rt = runtime()?;

    rt.block_on(async {
        let monitor = ctx.probe_monitor().await;
        let (sink, mut events) = ChannelSink::new(EVENT_CAPACITY);
        let engine = ctx.engine(queue.clone(), monitor.clone(), Arc::new(sink));
        let cancel = CancellationToken::new();

        let probe = ReachabilityProbe::for_url(
            &ctx.config.remote.url,
            ctx.config.probe.interval(),
            ctx.config.probe.timeout(),
        )
        .map(|probe| probe.spawn(monitor.clone(), cancel.clone()));

        let printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                println!("{}", event.summary());
            }
        });

        let (service, handle) = SyncService::new(engine);
        tokio::spawn(forward_enter(handle));

        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        });

        println!(
            "syncing to {} ({}, {} pending), Ctrl-C to stop",
            ctx.config.remote.url,
            monitor.current_status(),
            sales(queue.len())
        );
        service.run(cancel.clone()).await;
        cancel.cancel();

        if let Some(probe) = probe {
            if let Err(e) = probe.await {
                tracing::warn!(error = %e, "reachability probe task failed");
            }
        }
        // Ends once the service has dropped the engine and its sink
        if let Err(e) = printer.await {
            tracing::warn!(error = %e, "event printer failed");
        }
    });

    rt.shutdown_timeout(SHUTDOWN_GRACE);
    println!("stopped, {} pending sync", sales(queue.len()));
    Ok(())
}

/// Each line on stdin requests a sync.
async fn forward_enter(handle: SyncHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(_)) = lines.next_line().await {
        if !handle.request_sync() {
            break;
        }
    }
}
