// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable offline operation queue.
//!
//! The queue keeps an in-memory copy of the pending items and writes the
//! whole collection through its [`QueueStore`] on every mutation. The new
//! snapshot is saved first and only then swapped in, so when a write fails
//! memory and disk both still hold the last persisted state.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::item::{IdempotencyKey, ItemId, OpKind, QueueItem};
use crate::store::QueueStore;

/// Ordered, persisted collection of pending operations.
pub struct OperationQueue {
    items: Vec<QueueItem>,
    next_id: ItemId,
    store: Box<dyn QueueStore>,
    clock: Arc<dyn ClockSource>,
}

impl OperationQueue {
    /// Opens a queue over `store` using the system clock.
    pub fn open(store: impl QueueStore + 'static) -> Result<Self> {
        Self::open_with_clock(store, Arc::new(SystemClock))
    }

    /// Opens a queue over `store`, loading whatever it last persisted.
    pub fn open_with_clock(
        store: impl QueueStore + 'static,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self> {
        let loaded = store.load()?;
        let mut items: Vec<QueueItem> = Vec::with_capacity(loaded.len());
        for item in loaded {
            if items.iter().any(|i| i.id == item.id) {
                tracing::warn!(id = %item.id, "duplicate queue id in store, keeping first");
                continue;
            }
            items.push(item);
        }

        let next_id = items
            .iter()
            .map(|i| i.id)
            .max()
            .map(ItemId::next)
            .unwrap_or(ItemId(1));

        if !items.is_empty() {
            tracing::info!(pending = items.len(), "loaded offline queue");
        }

        Ok(OperationQueue { items, next_id, store: Box::new(store), clock })
    }

    /// Appends a new operation with a fresh idempotency key.
    pub fn enqueue(&mut self, kind: OpKind, payload: serde_json::Value) -> Result<ItemId> {
        self.enqueue_with_key(kind, payload, IdempotencyKey::generate())
    }

    /// Appends a new operation carrying an existing idempotency key.
    ///
    /// If an item with the same key is already queued, nothing is written and
    /// the existing item's id is returned.
    pub fn enqueue_with_key(
        &mut self,
        kind: OpKind,
        payload: serde_json::Value,
        key: IdempotencyKey,
    ) -> Result<ItemId> {
        if let Some(existing) = self.items.iter().find(|i| i.idempotency_key == key) {
            tracing::warn!(id = %existing.id, %key, "duplicate enqueue ignored");
            return Ok(existing.id);
        }

        let id = self.next_id;
        self.next_id = id.next();

        let mut next = self.items.clone();
        next.push(QueueItem::new(id, kind, payload, key, self.clock.now()));
        self.commit(next)?;

        tracing::debug!(%id, %kind, "enqueued");
        Ok(id)
    }

    /// Removes the item with `id`.
    ///
    /// Returns false (and writes nothing) if the item is not queued.
    pub fn remove(&mut self, id: ItemId) -> Result<bool> {
        if !self.contains(id) {
            return Ok(false);
        }
        let next = self.items.iter().filter(|i| i.id != id).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Records a failed replay of `id`.
    ///
    /// Returns the new attempt count, or `None` if the item is no longer
    /// queued. A missing item is never re-inserted.
    pub fn record_failure(&mut self, id: ItemId, reason: &str) -> Result<Option<u32>> {
        let now = self.clock.now();
        let Some(pos) = self.items.iter().position(|i| i.id == id) else {
            return Ok(None);
        };

        let mut next = self.items.clone();
        let item = &mut next[pos];
        item.attempts = item.attempts.saturating_add(1);
        item.last_error = Some(reason.to_string());
        item.last_attempt_at = Some(now);
        let attempts = item.attempts;

        self.commit(next)?;
        Ok(Some(attempts))
    }

    /// Empties the queue, returning how many items were dropped.
    pub fn clear(&mut self) -> Result<usize> {
        let dropped = self.items.len();
        self.commit(Vec::new())?;
        Ok(dropped)
    }

    /// Snapshot of all items in enqueue order.
    pub fn list(&self) -> Vec<QueueItem> {
        self.items.clone()
    }

    /// Snapshot of the items enqueued after `id`, in order.
    pub fn list_after(&self, id: ItemId) -> Vec<QueueItem> {
        self.items.iter().filter(|i| i.id > id).cloned().collect()
    }

    /// Returns a copy of the item with `id`.
    pub fn get(&self, id: ItemId) -> Option<QueueItem> {
        self.items.iter().find(|i| i.id == id).cloned()
    }

    /// Returns true if `id` is still queued.
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    /// Number of pending items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current time according to the queue's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn commit(&mut self, next: Vec<QueueItem>) -> Result<()> {
        self.store.save(&next).map_err(|e| {
            tracing::error!(error = %e, "failed to persist offline queue");
            Error::Persistence(e.to_string())
        })?;
        self.items = next;
        Ok(())
    }
}

/// Handle to a queue shared between the engine, the recorder and the
/// session hook.
///
/// Each method takes the lock for the duration of one queue operation; the
/// lock is never held across an `.await`.
#[derive(Clone)]
pub struct SharedQueue {
    inner: Arc<Mutex<OperationQueue>>,
}

impl std::fmt::Debug for SharedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedQueue").finish_non_exhaustive()
    }
}

impl SharedQueue {
    /// Wraps an opened queue.
    pub fn new(queue: OperationQueue) -> Self {
        SharedQueue { inner: Arc::new(Mutex::new(queue)) }
    }

    fn lock(&self) -> MutexGuard<'_, OperationQueue> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// See [`OperationQueue::enqueue`].
    pub fn enqueue(&self, kind: OpKind, payload: serde_json::Value) -> Result<ItemId> {
        self.lock().enqueue(kind, payload)
    }

    /// See [`OperationQueue::enqueue_with_key`].
    pub fn enqueue_with_key(
        &self,
        kind: OpKind,
        payload: serde_json::Value,
        key: IdempotencyKey,
    ) -> Result<ItemId> {
        self.lock().enqueue_with_key(kind, payload, key)
    }

    /// See [`OperationQueue::remove`].
    pub fn remove(&self, id: ItemId) -> Result<bool> {
        self.lock().remove(id)
    }

    /// See [`OperationQueue::record_failure`].
    pub fn record_failure(&self, id: ItemId, reason: &str) -> Result<Option<u32>> {
        self.lock().record_failure(id, reason)
    }

    /// See [`OperationQueue::clear`].
    pub fn clear(&self) -> Result<usize> {
        self.lock().clear()
    }

    /// See [`OperationQueue::list`].
    pub fn list(&self) -> Vec<QueueItem> {
        self.lock().list()
    }

    /// See [`OperationQueue::list_after`].
    pub fn list_after(&self, id: ItemId) -> Vec<QueueItem> {
        self.lock().list_after(id)
    }

    /// See [`OperationQueue::get`].
    pub fn get(&self, id: ItemId) -> Option<QueueItem> {
        self.lock().get(id)
    }

    /// See [`OperationQueue::contains`].
    pub fn contains(&self, id: ItemId) -> bool {
        self.lock().contains(id)
    }

    /// See [`OperationQueue::len`].
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// See [`OperationQueue::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// See [`OperationQueue::now`].
    pub fn now(&self) -> DateTime<Utc> {
        self.lock().now()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
