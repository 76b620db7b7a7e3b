// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running sync service.
//!
//! [`SyncService::run`] owns the event loop that turns outside events into
//! engine triggers: connectivity coming back, a manual sync request, and a
//! backed-off item becoming due. Drains run as spawned tasks so the loop
//! stays responsive; overlapping triggers are absorbed by the engine's
//! single-flight check.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::connectivity::Transition;
use crate::engine::{DrainOutcome, SyncEngine, Trigger};

/// Requests a sync from a running [`SyncService`].
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<()>,
}

impl SyncHandle {
    /// Asks for a drain. Returns false if the service has stopped.
    ///
    /// Requests made while one is already pending collapse into it.
    pub fn request_sync(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

/// Event loop driving a [`SyncEngine`].
pub struct SyncService {
    engine: SyncEngine,
    requests: mpsc::Receiver<()>,
}

impl SyncService {
    pub fn new(engine: SyncEngine) -> (Self, SyncHandle) {
        let (tx, requests) = mpsc::channel(1);
        (SyncService { engine, requests }, SyncHandle { tx })
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Runs until `cancel` fires or the monitor goes away.
    ///
    /// Drains once at startup if online. On cancellation a drain in
    /// progress is aborted; the item it was sending stays queued.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut transitions = self.engine.monitor().subscribe();
        let mut drains: JoinSet<DrainOutcome> = JoinSet::new();

        tracing::info!(
            pending = self.engine.queue().len(),
            status = %self.engine.monitor().current_status(),
            "sync service started"
        );
        if self.engine.monitor().is_online() {
            self.spawn_drain(&mut drains, Trigger::Connectivity);
        }

        loop {
            // Only wake for retries when a drain could actually run
            let retry_in = if drains.is_empty() && self.engine.monitor().is_online() {
                self.engine.next_retry_in()
            } else {
                None
            };

            tokio::select! {
                _ = cancel.cancelled() => break,

                transition = transitions.next_transition() => match transition {
                    Some(Transition::BecameOnline) => {
                        self.spawn_drain(&mut drains, Trigger::Connectivity);
                    }
                    Some(Transition::BecameOffline) => {
                        tracing::debug!("offline, sync paused");
                    }
                    None => break,
                },

                Some(()) = self.requests.recv() => {
                    self.spawn_drain(&mut drains, Trigger::Manual);
                }

                _ = tokio::time::sleep(retry_in.unwrap_or(Duration::ZERO)), if retry_in.is_some() => {
                    self.spawn_drain(&mut drains, Trigger::Retry);
                }

                Some(joined) = drains.join_next(), if !drains.is_empty() => match joined {
                    Ok(outcome) => tracing::debug!(?outcome, "drain task done"),
                    Err(e) => tracing::warn!(error = %e, "drain task failed"),
                },
            }
        }

        drains.shutdown().await;
        tracing::info!(pending = self.engine.queue().len(), "sync service stopped");
    }

    fn spawn_drain(&self, drains: &mut JoinSet<DrainOutcome>, trigger: Trigger) {
        let engine = self.engine.clone();
        drains.spawn(async move { engine.trigger(trigger).await });
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
