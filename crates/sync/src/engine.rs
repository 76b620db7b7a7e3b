// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronization engine.
//!
//! The engine replays queued operations against the remote API, oldest
//! first. Only one drain runs at a time: a trigger that arrives while a
//! drain is in progress is reported as [`DrainOutcome::AlreadyDraining`]
//! and otherwise ignored. The running drain notes the refused trigger and
//! takes one more look for newer items before it finishes.
//!
//! An item leaves the queue only when the server confirms it. Every other
//! outcome (network failure, timeout, rejection) is recorded on the item
//! and it stays for the next drain, unless the retry policy's attempt
//! threshold says to abandon it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tq_core::{ItemId, QueueItem, SharedQueue};

use crate::api::{ApiError, RemoteApi, Submission};
use crate::connectivity::ConnectivityMonitor;
use crate::notify::{NotificationSink, SyncEvent};
use crate::retry::RetryPolicy;

/// Default bound on a single remote send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether a drain is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Draining,
}

/// What asked for a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Connectivity came back.
    Connectivity,
    /// The user or a command asked.
    Manual,
    /// A backed-off item became due.
    Retry,
}

/// Counts from one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub synced: usize,
    pub failed: usize,
    pub abandoned: usize,
    /// Items skipped because their backoff delay had not passed.
    pub deferred: usize,
    /// True if the drain stopped early (went offline or the session ended).
    pub interrupted: bool,
    /// Items left in the queue afterwards.
    pub pending: usize,
}

impl DrainReport {
    /// Folds a follow-up pass into this one.
    fn absorb(&mut self, later: DrainReport) {
        self.synced += later.synced;
        self.failed += later.failed;
        self.abandoned += later.abandoned;
        self.deferred += later.deferred;
        self.interrupted = later.interrupted;
        self.pending = later.pending;
    }
}

/// Result of [`SyncEngine::trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was already running.
    AlreadyDraining,
    /// Not started: connectivity is offline.
    Offline,
    /// Not started: nothing queued.
    Empty,
    Completed(DrainReport),
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bound on each remote send. A send that runs out is a retained failure.
    pub send_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { send_timeout: DEFAULT_SEND_TIMEOUT, retry: RetryPolicy::default() }
    }
}

impl DrainOutcome {
    /// Combines the outcomes of consecutive passes of one trigger.
    fn then(self, later: DrainOutcome) -> DrainOutcome {
        match (self, later) {
            (DrainOutcome::Completed(mut first), DrainOutcome::Completed(second)) => {
                first.absorb(second);
                DrainOutcome::Completed(first)
            }
            (first @ DrainOutcome::Completed(_), _) => first,
            (_, later) => later,
        }
    }
}

/// Retry hold while queue writes are failing.
///
/// An item whose failure could not be persisted keeps its old
/// `last_attempt_at`, so the backoff delay is tracked here instead.
#[derive(Debug, Default)]
struct WriteHold {
    failures: u32,
    until: Option<DateTime<Utc>>,
}

struct Inner {
    queue: SharedQueue,
    api: Arc<dyn RemoteApi>,
    monitor: ConnectivityMonitor,
    sink: Arc<dyn NotificationSink>,
    config: EngineConfig,
    draining: AtomicBool,
    /// Set by a trigger refused while a drain was running.
    missed: AtomicBool,
    /// Bumped on logout; a drain started under an older epoch stops.
    epoch: AtomicU64,
    hold: Mutex<WriteHold>,
}

/// Resets the draining flag however the drain ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Single-flight drainer of the offline queue. Clones share state.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

impl SyncEngine {
    pub fn new(
        queue: SharedQueue,
        api: Arc<dyn RemoteApi>,
        monitor: ConnectivityMonitor,
        sink: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        SyncEngine {
            inner: Arc::new(Inner {
                queue,
                api,
                monitor,
                sink,
                config,
                draining: AtomicBool::new(false),
                missed: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                hold: Mutex::new(WriteHold::default()),
            }),
        }
    }

    pub fn state(&self) -> EngineState {
        if self.inner.draining.load(Ordering::Acquire) {
            EngineState::Draining
        } else {
            EngineState::Idle
        }
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.inner.queue
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.inner.monitor
    }

    pub fn api(&self) -> &Arc<dyn RemoteApi> {
        &self.inner.api
    }

    pub fn sink(&self) -> &Arc<dyn NotificationSink> {
        &self.inner.sink
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current session epoch.
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    /// Ends the current session's drain.
    ///
    /// A running drain stops before its next send. A send already in
    /// flight may still complete, but its result cannot put anything back
    /// into the queue.
    pub fn reset(&self) {
        let epoch = self.inner.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(epoch, "sync engine reset");
    }

    /// Time until the next backed-off item becomes due, if any.
    pub fn next_retry_in(&self) -> Option<Duration> {
        let items = self.inner.queue.list();
        let now = self.inner.queue.now();
        let wake = self.inner.config.retry.next_wakeup(&items, now)?;
        match self.held_until(now) {
            Some(until) => Some(wake.max((until - now).to_std().unwrap_or(Duration::ZERO))),
            None => Some(wake),
        }
    }

    /// Drains the queue unless a drain is already running, the monitor says
    /// offline, or there is nothing to send.
    ///
    /// Once a pass ends, the drain keeps going with items enqueued after it
    /// if a trigger was refused meanwhile or the session changed under it.
    pub async fn trigger(&self, trigger: Trigger) -> DrainOutcome {
        let inner = &self.inner;
        let mut seen = None;
        let mut outcome: Option<DrainOutcome> = None;

        loop {
            // Flag first, so a drain finishing right now still sees it
            inner.missed.store(true, Ordering::SeqCst);
            if inner
                .draining
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                tracing::debug!(?trigger, "drain already running, trigger deferred to it");
                return outcome.unwrap_or(DrainOutcome::AlreadyDraining);
            }

            let epoch = self.epoch();
            let pass = {
                let _guard = DrainGuard(&inner.draining);
                inner.missed.store(false, Ordering::SeqCst);
                self.drain_once(trigger, &mut seen).await
            };
            outcome = Some(match outcome {
                Some(earlier) => earlier.then(pass),
                None => pass,
            });

            let restarted = self.epoch() != epoch;
            if !inner.missed.swap(false, Ordering::SeqCst) && !restarted {
                break;
            }
            tracing::debug!(restarted, "checking for items newer than the last pass");
        }

        outcome.unwrap_or(DrainOutcome::Empty)
    }

    /// One pass over everything after `seen` (the whole queue at first).
    async fn drain_once(&self, trigger: Trigger, seen: &mut Option<ItemId>) -> DrainOutcome {
        if !self.inner.monitor.is_online() {
            tracing::debug!(?trigger, "offline, not draining");
            return DrainOutcome::Offline;
        }
        let batch = match *seen {
            Some(mark) => self.inner.queue.list_after(mark),
            None => self.inner.queue.list(),
        };
        if batch.is_empty() {
            return DrainOutcome::Empty;
        }
        DrainOutcome::Completed(self.drain(trigger, batch, seen).await)
    }

    async fn drain(
        &self,
        trigger: Trigger,
        mut batch: Vec<QueueItem>,
        seen: &mut Option<ItemId>,
    ) -> DrainReport {
        let inner = &self.inner;
        let epoch = self.epoch();
        let mut report = DrainReport::default();

        tracing::info!(?trigger, pending = batch.len(), "sync started");
        inner.sink.notify(SyncEvent::SyncStarted { pending: batch.len() });

        'drain: loop {
            let mut watermark = None;
            for item in batch {
                watermark = Some(item.id);

                if self.epoch() != epoch {
                    tracing::info!("session ended, stopping drain");
                    report.interrupted = true;
                    break 'drain;
                }
                if !inner.monitor.is_online() {
                    tracing::info!("went offline, stopping drain");
                    report.interrupted = true;
                    break 'drain;
                }
                *seen = Some(item.id);
                if !inner.queue.contains(item.id) {
                    tracing::debug!(id = %item.id, "item left the queue, skipping");
                    continue;
                }
                let now = inner.queue.now();
                if !inner.config.retry.is_due(&item, now) || self.held_until(now).is_some() {
                    tracing::debug!(id = %item.id, attempts = item.attempts, "backing off");
                    report.deferred += 1;
                    continue;
                }

                self.replay(&item, &mut report).await;
            }

            // Pick up anything enqueued while this pass was running
            let Some(mark) = watermark else { break };
            batch = inner.queue.list_after(mark);
            if batch.is_empty() {
                break;
            }
            tracing::debug!(newer = batch.len(), "continuing with items enqueued during drain");
        }

        report.pending = inner.queue.len();
        tracing::info!(
            synced = report.synced,
            failed = report.failed,
            abandoned = report.abandoned,
            pending = report.pending,
            "sync finished"
        );
        inner.sink.notify(SyncEvent::SyncFinished {
            synced: report.synced,
            failed: report.failed,
            pending: report.pending,
        });
        report
    }

    async fn replay(&self, item: &QueueItem, report: &mut DrainReport) {
        let inner = &self.inner;
        let send_timeout = inner.config.send_timeout;
        let submission = Submission::for_item(item);

        let result = match tokio::time::timeout(send_timeout, inner.api.submit(submission)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(send_timeout)),
        };

        match result {
            Ok(confirmation) => {
                tracing::debug!(
                    id = %item.id,
                    record_id = %confirmation.record_id,
                    replayed = confirmation.replayed,
                    "item synced"
                );
                match inner.queue.remove(item.id) {
                    Ok(true) => self.write_succeeded(),
                    Ok(false) => tracing::debug!(id = %item.id, "synced item already gone"),
                    Err(e) => self.persistence_failed(Some(item.id), &e),
                }
                report.synced += 1;
                inner.sink.notify(SyncEvent::ItemSynced {
                    id: item.id,
                    kind: item.kind,
                    record_id: confirmation.record_id,
                });
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(id = %item.id, error = %err, "replay failed, keeping item");
                report.failed += 1;

                match inner.queue.record_failure(item.id, &reason) {
                    Ok(Some(attempts)) => {
                        self.write_succeeded();
                        inner.sink.notify(SyncEvent::ItemFailed {
                            id: item.id,
                            kind: item.kind,
                            attempts,
                            reason: reason.clone(),
                        });
                        if inner.config.retry.is_exhausted(attempts) {
                            self.abandon(item.id, reason, report);
                        }
                    }
                    // Cleared mid-send; must not come back
                    Ok(None) => tracing::debug!(id = %item.id, "failed item already gone"),
                    Err(e) => self.persistence_failed(Some(item.id), &e),
                }
            }
        }
    }

    fn abandon(&self, id: ItemId, reason: String, report: &mut DrainReport) {
        let inner = &self.inner;
        let Some(item) = inner.queue.get(id) else {
            return;
        };
        match inner.queue.remove(id) {
            Ok(true) => {
                tracing::warn!(
                    %id,
                    key = %item.idempotency_key,
                    attempts = item.attempts,
                    "retry limit reached, abandoning item"
                );
                report.abandoned += 1;
                inner.sink.notify(SyncEvent::ItemAbandoned { item, reason });
            }
            Ok(false) => {}
            Err(e) => self.persistence_failed(Some(id), &e),
        }
    }

    fn persistence_failed(&self, id: Option<ItemId>, err: &tq_core::Error) {
        tracing::error!(?id, error = %err, "queue write failed during sync");
        let now = self.inner.queue.now();
        {
            let mut hold = self.inner.hold.lock().unwrap_or_else(PoisonError::into_inner);
            hold.failures = hold.failures.saturating_add(1);
            let delay = self.inner.config.retry.delay_after(hold.failures);
            hold.until = chrono::Duration::from_std(delay)
                .ok()
                .and_then(|delay| now.checked_add_signed(delay))
                .or(Some(DateTime::<Utc>::MAX_UTC));
        }
        self.inner.sink.notify(SyncEvent::PersistenceFailed { id, reason: err.to_string() });
    }

    fn write_succeeded(&self) {
        let mut hold = self.inner.hold.lock().unwrap_or_else(PoisonError::into_inner);
        *hold = WriteHold::default();
    }

    /// End of the write-failure hold, if it is still in force at `now`.
    fn held_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let hold = self.inner.hold.lock().unwrap_or_else(PoisonError::into_inner);
        hold.until.filter(|until| *until > now)
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("state", &self.state())
            .field("epoch", &self.epoch())
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
