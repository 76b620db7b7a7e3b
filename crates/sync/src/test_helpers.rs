// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::Notify;
use tq_core::protocol::{ClientMessage, ServerMessage};
use tq_core::{IdempotencyKey, MemoryStore, OperationQueue, SharedQueue};

use crate::api::{ApiError, ApiResult, Confirmation, RemoteApi, Submission};
use crate::notify::{NotificationSink, SyncEvent};
use crate::transport::{Transport, TransportError, TransportFuture};

/// A sale payload with one line.
pub fn sale_payload(sku: &str) -> serde_json::Value {
    json!({"items": [{"sku": sku, "qty": 1}], "total": 10.0})
}

/// A queue over a fresh in-memory store.
pub fn memory_queue() -> (SharedQueue, MemoryStore) {
    let store = MemoryStore::new();
    let queue = OperationQueue::open(store.clone()).unwrap();
    (SharedQueue::new(queue), store)
}

/// Mock transport for testing without real sockets.
#[derive(Default)]
pub struct MockTransport {
    connected: bool,
    /// Messages that will be returned by recv().
    incoming: Arc<Mutex<VecDeque<ServerMessage>>>,
    /// Messages that were sent via send().
    outgoing: Arc<Mutex<Vec<ClientMessage>>>,
    connect_should_fail: bool,
    connects: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message that will be returned by recv().
    pub fn queue_incoming(&self, msg: ServerMessage) {
        self.incoming.lock().unwrap().push_back(msg);
    }

    /// Handle to the sent messages that survives moving the transport.
    pub fn outgoing_handle(&self) -> Arc<Mutex<Vec<ClientMessage>>> {
        Arc::clone(&self.outgoing)
    }

    /// Handle to the incoming queue that survives moving the transport.
    pub fn incoming_handle(&self) -> Arc<Mutex<VecDeque<ServerMessage>>> {
        Arc::clone(&self.incoming)
    }

    /// Handle to the number of connect calls.
    pub fn connects_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }

    /// Set whether connect should fail.
    pub fn set_connect_fail(&mut self, fail: bool) {
        self.connect_should_fail = fail;
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.connect_should_fail {
                Err(TransportError::ConnectionFailed("mock failure".into()))
            } else {
                self.connected = true;
                Ok(())
            }
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            self.outgoing.lock().unwrap().push(msg);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            let msg = self.incoming.lock().unwrap().pop_front();
            if msg.is_none() {
                // Server went away
                self.connected = false;
            }
            Ok(msg)
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Scripted behavior for one [`MockApi`] call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Create the record (or return the original for a known key).
    Accept,
    /// Fail without touching server state.
    Fail(ApiError),
    /// Create the record, then never answer.
    AcceptThenHang,
    /// Never answer.
    Hang,
}

/// In-memory sale server honoring the idempotency contract.
#[derive(Default)]
pub struct MockApi {
    script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Submission>>,
    records: Mutex<HashMap<IdempotencyKey, String>>,
    gate: Option<Arc<Notify>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockApi {
    /// A server that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A server that answers the next calls as scripted, then accepts.
    pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Self {
        MockApi { script: Mutex::new(replies.into_iter().collect()), ..Self::default() }
    }

    /// A server whose calls block until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        MockApi { gate: Some(gate), ..Self::default() }
    }

    /// Scripts the next replies of an existing server.
    pub fn with_replies(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.script.lock().unwrap().extend(replies);
        self
    }

    /// All submissions received, in order.
    pub fn calls(&self) -> Vec<Submission> {
        self.calls.lock().unwrap().clone()
    }

    /// SKUs of the first line of each submission, in order.
    pub fn call_skus(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|s| s.payload["items"][0]["sku"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Number of distinct records created server-side.
    pub fn records_created(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Highest number of concurrent submit calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn create(&self, key: IdempotencyKey) -> Confirmation {
        let mut records = self.records.lock().unwrap();
        if let Some(existing) = records.get(&key) {
            return Confirmation { record_id: existing.clone(), replayed: true };
        }
        let record_id = format!("sale-{}", records.len() + 1);
        records.insert(key, record_id.clone());
        Confirmation { record_id, replayed: false }
    }
}

impl RemoteApi for MockApi {
    fn submit(
        &self,
        submission: Submission,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Confirmation>> + Send + '_>> {
        Box::pin(async move {
            let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);
            self.calls.lock().unwrap().push(submission.clone());

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            let reply = self.script.lock().unwrap().pop_front().unwrap_or(Reply::Accept);
            match reply {
                Reply::Accept => Ok(self.create(submission.key)),
                Reply::Fail(err) => Err(err),
                Reply::AcceptThenHang => {
                    self.create(submission.key);
                    std::future::pending().await
                }
                Reply::Hang => std::future::pending().await,
            }
        })
    }
}

/// Counts a call as in flight until dropped (including by a timeout).
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<String> {
        self.events().iter().map(SyncEvent::summary).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: SyncEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Wait (bounded) until `cond` holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
