// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the offline queue module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::clock::ManualClock;
use crate::store::{JsonFileStore, MemoryStore};
use chrono::{Duration, TimeZone};
use serde_json::json;
use tempfile::tempdir;

fn sale(sku: &str) -> serde_json::Value {
    json!({"items": [{"sku": sku, "qty": 1}], "total": 10.0})
}

fn memory_queue() -> (OperationQueue, MemoryStore) {
    let store = MemoryStore::new();
    (OperationQueue::open(store.clone()).unwrap(), store)
}

#[test]
fn test_enqueue_and_list() {
    let (mut queue, _) = memory_queue();
    assert!(queue.is_empty());

    let a = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    let b = queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();

    assert_eq!(queue.len(), 2);
    let items = queue.list();
    assert_eq!(items[0].id, a);
    assert_eq!(items[1].id, b);
    assert_eq!(items[0].payload, sale("A"));
    assert_eq!(items[0].attempts, 0);
    assert!(a < b);
}

#[test]
fn test_similar_items_are_not_coalesced() {
    let (mut queue, _) = memory_queue();
    queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_enqueue_persists_before_returning() {
    let (mut queue, store) = memory_queue();
    let id = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    let stored = store.snapshot();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
}

#[test]
fn test_enqueue_failure_is_surfaced_and_not_queued() {
    let (mut queue, store) = memory_queue();
    queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();

    store.set_fail_writes(true);
    let err = queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap_err();
    assert!(matches!(err, Error::Persistence(_)));
    assert_eq!(queue.len(), 1);
    assert_eq!(store.snapshot().len(), 1);
}

#[test]
fn test_ids_not_reused_after_failed_write() {
    let (mut queue, store) = memory_queue();
    store.set_fail_writes(true);
    assert!(queue.enqueue(OpKind::SaleCreation, sale("A")).is_err());
    store.set_fail_writes(false);

    let id = queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();
    assert_eq!(id, ItemId(2));
}

#[test]
fn test_ids_not_reused_after_remove() {
    let (mut queue, _) = memory_queue();
    let a = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    queue.remove(a).unwrap();
    let b = queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();
    assert!(b > a);
}

#[test]
fn test_duplicate_key_returns_existing_id() {
    let (mut queue, store) = memory_queue();
    let key = IdempotencyKey::generate();
    let first = queue.enqueue_with_key(OpKind::SaleCreation, sale("A"), key).unwrap();
    let saves = store.save_count();

    let second = queue.enqueue_with_key(OpKind::SaleCreation, sale("A"), key).unwrap();

    assert_eq!(first, second);
    assert_eq!(queue.len(), 1);
    assert_eq!(store.save_count(), saves);
}

#[test]
fn test_remove_is_idempotent() {
    let (mut queue, _) = memory_queue();
    let a = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();

    assert!(queue.remove(a).unwrap());
    assert_eq!(queue.len(), 1);

    assert!(!queue.remove(a).unwrap());
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_remove_keeps_order_of_rest() {
    let (mut queue, _) = memory_queue();
    let a = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    let b = queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();
    let c = queue.enqueue(OpKind::SaleCreation, sale("C")).unwrap();

    queue.remove(b).unwrap();

    let ids: Vec<_> = queue.list().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![a, c]);
}

#[test]
fn test_clear() {
    let (mut queue, store) = memory_queue();
    queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();

    assert_eq!(queue.clear().unwrap(), 2);

    assert!(queue.is_empty());
    assert!(store.snapshot().is_empty());
}

#[test]
fn test_record_failure_updates_item() {
    let start = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::at(start));
    let store = MemoryStore::new();
    let mut queue = OperationQueue::open_with_clock(store.clone(), clock.clone()).unwrap();
    let id = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();

    clock.advance(Duration::seconds(30));
    assert_eq!(queue.record_failure(id, "timeout").unwrap(), Some(1));
    assert_eq!(queue.record_failure(id, "connection refused").unwrap(), Some(2));

    let item = queue.get(id).unwrap();
    assert_eq!(item.attempts, 2);
    assert_eq!(item.last_error.as_deref(), Some("connection refused"));
    assert_eq!(item.enqueued_at, start);
    assert_eq!(item.last_attempt_at, Some(start + Duration::seconds(30)));
    assert_eq!(store.snapshot()[0].attempts, 2);
}

#[test]
fn test_record_failure_after_clear_does_not_reinsert() {
    let (mut queue, store) = memory_queue();
    let id = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    queue.clear().unwrap();

    assert_eq!(queue.record_failure(id, "timeout").unwrap(), None);
    assert!(queue.is_empty());
    assert!(store.snapshot().is_empty());
}

#[test]
fn test_list_is_a_snapshot() {
    let (mut queue, _) = memory_queue();
    queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    let snapshot = queue.list();

    queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();
    queue.clear().unwrap();

    assert_eq!(snapshot.len(), 1);
}

#[test]
fn test_list_after() {
    let (mut queue, _) = memory_queue();
    let a = queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    let b = queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap();
    let c = queue.enqueue(OpKind::SaleCreation, sale("C")).unwrap();

    let ids: Vec<_> = queue.list_after(a).iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![b, c]);
}

#[test]
fn test_persistence_across_restart() {
    let dir = tempdir().unwrap();
    let ids;

    {
        let store = JsonFileStore::open(dir.path(), "sales").unwrap();
        let mut queue = OperationQueue::open(store).unwrap();
        ids = vec![
            queue.enqueue(OpKind::SaleCreation, sale("A")).unwrap(),
            queue.enqueue(OpKind::SaleCreation, sale("B")).unwrap(),
        ];
    }

    let store = JsonFileStore::open(dir.path(), "sales").unwrap();
    let mut queue = OperationQueue::open(store).unwrap();
    let listed: Vec<_> = queue.list().iter().map(|i| i.id).collect();
    assert_eq!(listed, ids);

    // Counter resumes above what survived
    let next = queue.enqueue(OpKind::SaleCreation, sale("C")).unwrap();
    assert!(next > ids[1]);
}

#[test]
fn test_duplicate_ids_in_store_are_dropped_on_load() {
    let mut store = MemoryStore::new();
    let item = QueueItem::new(
        ItemId(4),
        OpKind::SaleCreation,
        sale("A"),
        IdempotencyKey::generate(),
        Utc::now(),
    );
    let mut dup = item.clone();
    dup.payload = sale("B");
    store.save(&[item.clone(), dup]).unwrap();

    let queue = OperationQueue::open(store).unwrap();
    assert_eq!(queue.list(), vec![item]);
}

#[test]
fn test_shared_queue_clones_see_same_items() {
    let (queue, _) = memory_queue();
    let shared = SharedQueue::new(queue);
    let other = shared.clone();

    let id = shared.enqueue(OpKind::SaleCreation, sale("A")).unwrap();
    assert!(other.contains(id));
    assert_eq!(other.len(), 1);
    assert!(other.remove(id).unwrap());
    assert!(shared.is_empty());
}
