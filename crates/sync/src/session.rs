// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle hook.
//!
//! Queued sales belong to the cashier who rang them up. When the session
//! ends the queue is emptied and the engine is reset before the hook
//! returns, whether or not a drain is running.

use tq_core::Result;

use crate::engine::SyncEngine;
use crate::notify::SyncEvent;

/// Login/logout notifications from the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { user: String },
    Ended,
}

/// Reacts to session events on behalf of the sync engine.
#[derive(Debug, Clone)]
pub struct SessionHook {
    engine: SyncEngine,
}

impl SessionHook {
    pub fn new(engine: SyncEngine) -> Self {
        SessionHook { engine }
    }

    /// Handles one event. Returns how many queued items were dropped.
    pub fn handle(&self, event: SessionEvent) -> Result<usize> {
        match event {
            SessionEvent::Started { user } => {
                tracing::info!(%user, "session started");
                Ok(0)
            }
            SessionEvent::Ended => self.end_session(),
        }
    }

    /// Stops any running drain and drops everything queued.
    ///
    /// A send already in flight may still complete on the server, but its
    /// result cannot put the item back.
    pub fn end_session(&self) -> Result<usize> {
        self.engine.reset();
        let dropped = self.engine.queue().clear()?;
        tracing::info!(dropped, "session ended, offline queue cleared");
        self.engine.sink().notify(SyncEvent::QueueCleared { dropped });
        Ok(dropped)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
