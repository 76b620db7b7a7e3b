// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tq-sync: Offline sale synchronization.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ transitions ┌──────────────┐  submit   ┌─────────────┐
//! │ Connectivity │────────────►│  SyncEngine  │──────────►│  RemoteApi  │
//! │   Monitor    │             │ (single-     │◄──────────│ (WebSocket) │
//! └──────▲───────┘             │  flight)     │           └─────────────┘
//!        │ report              └──────┬───────┘
//! ┌──────┴───────┐                    │ list / remove / record_failure
//! │ Reachability │             ┌──────▼───────┐           ┌─────────────┐
//! │    Probe     │             │ SharedQueue  │◄──────────│ SessionHook │
//! └──────────────┘             │  (tq-core)   │   clear   └─────────────┘
//!                              └──────▲───────┘
//!                                     │ enqueue (offline / failed send)
//!                              ┌──────┴───────┐
//!                              │ SaleRecorder │
//!                              └──────────────┘
//! ```
//!
//! [`SyncService`] ties it together: it listens for online transitions,
//! manual sync requests and backoff wake-ups and triggers the engine.

mod api;
mod connectivity;
mod engine;
mod notify;
mod probe;
mod recorder;
mod retry;
mod service;
mod session;
mod transport;

pub use api::{ApiError, ApiResult, Confirmation, RemoteApi, Submission, WebSocketApi};
pub use connectivity::{Connectivity, ConnectivityMonitor, Subscription, Transition};
pub use engine::{
    DrainOutcome, DrainReport, EngineConfig, EngineState, SyncEngine, Trigger, DEFAULT_SEND_TIMEOUT,
};
pub use notify::{ChannelSink, LogSink, NotificationSink, NullSink, SyncEvent};
pub use probe::{check_reachable, probe_target, ReachabilityProbe};
pub use recorder::{Recorded, SaleRecorder};
pub use retry::{RetryPolicy, RetryStrategy};
pub use service::{SyncHandle, SyncService};
pub use session::{SessionEvent, SessionHook};
pub use transport::{
    Transport, TransportError, TransportFuture, TransportResult, WebSocketTransport,
};

#[cfg(test)]
mod test_helpers;
