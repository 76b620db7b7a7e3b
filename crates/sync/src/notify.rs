// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync status events and where they go.
//!
//! Sinks are called from inside the drain loop and must not block.

use tokio::sync::mpsc;
use tq_core::{ItemId, OpKind, QueueItem};

/// Something the user may want to hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A sale was stored for later replay.
    SaleQueued { id: ItemId, pending: usize },
    /// A drain began with this many items queued.
    SyncStarted { pending: usize },
    /// The server confirmed an item and it left the queue.
    ItemSynced { id: ItemId, kind: OpKind, record_id: String },
    /// A replay failed; the item stays queued.
    ItemFailed { id: ItemId, kind: OpKind, attempts: u32, reason: String },
    /// The retry policy gave up on an item and removed it.
    ItemAbandoned { item: QueueItem, reason: String },
    /// A drain ended.
    SyncFinished { synced: usize, failed: usize, pending: usize },
    /// The queue was emptied on logout.
    QueueCleared { dropped: usize },
    /// A queue write failed during a drain.
    PersistenceFailed { id: Option<ItemId>, reason: String },
}

fn count(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

impl SyncEvent {
    /// Short, count-based text for display.
    pub fn summary(&self) -> String {
        match self {
            SyncEvent::SaleQueued { pending, .. } => {
                format!("sale saved offline, {} pending sync", count(*pending, "sale", "sales"))
            }
            SyncEvent::SyncStarted { pending } => {
                format!("syncing {}", count(*pending, "item", "items"))
            }
            SyncEvent::ItemSynced { kind, record_id, .. } => {
                format!("{} synced as {record_id}", kind.display_name())
            }
            SyncEvent::ItemFailed { kind, reason, .. } => {
                format!("{} sync failed: {reason}", kind.display_name())
            }
            SyncEvent::ItemAbandoned { item, reason } => {
                format!("{} {} dropped after failures: {reason}", item.kind.display_name(), item.id)
            }
            SyncEvent::SyncFinished { synced, failed, pending } => {
                let mut parts = Vec::new();
                if *synced > 0 {
                    parts.push(format!("{} synced", count(*synced, "item", "items")));
                }
                if *failed > 0 {
                    parts.push(format!("sync failed for {}", count(*failed, "item", "items")));
                }
                if parts.is_empty() {
                    parts.push("nothing synced".to_string());
                }
                if *pending > 0 && *failed == 0 {
                    parts.push(format!("{} pending", count(*pending, "item", "items")));
                }
                parts.join(", ")
            }
            SyncEvent::QueueCleared { dropped } => {
                format!("cleared {} from the offline queue", count(*dropped, "item", "items"))
            }
            SyncEvent::PersistenceFailed { reason, .. } => {
                format!("could not save the offline queue: {reason}")
            }
        }
    }
}

/// Receives sync events.
pub trait NotificationSink: Send + Sync {
    /// Must return promptly.
    fn notify(&self, event: SyncEvent);
}

impl<S: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<S> {
    fn notify(&self, event: SyncEvent) {
        (**self).notify(event)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: SyncEvent) {}
}

/// Writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, event: SyncEvent) {
        match &event {
            SyncEvent::ItemFailed { id, attempts, .. } => {
                tracing::warn!(%id, attempts, "{}", event.summary());
            }
            SyncEvent::ItemAbandoned { item, .. } => {
                tracing::warn!(id = %item.id, key = %item.idempotency_key, "{}", event.summary());
            }
            SyncEvent::PersistenceFailed { .. } => tracing::error!("{}", event.summary()),
            SyncEvent::ItemSynced { id, .. } => tracing::debug!(%id, "{}", event.summary()),
            _ => tracing::info!("{}", event.summary()),
        }
    }
}

/// Forwards events into a bounded channel.
///
/// When the channel is full or closed the event is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<SyncEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SyncEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (ChannelSink { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, event: SyncEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::debug!(error = %e, "dropping sync event");
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
