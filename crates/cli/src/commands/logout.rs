// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tq_sync::{Connectivity, ConnectivityMonitor, LogSink, SessionEvent, SessionHook, SyncEvent};

use crate::error::Result;

use super::Context;

/// Ends the session: every queued sale is dropped without being sent.
pub fn run(ctx: &Context) -> Result<()> {
    let queue = ctx.open_queue()?;
    let engine =
        ctx.engine(queue, ConnectivityMonitor::new(Connectivity::Offline), Arc::new(LogSink));

    let dropped = SessionHook::new(engine).handle(SessionEvent::Ended)?;
    println!("{}", SyncEvent::QueueCleared { dropped }.summary());
    Ok(())
}
