// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tq-core: Shared library for the tillq offline sale queue
//!
//! This crate provides the queue data model, the durable operation queue and
//! its persistence backends, and the wire protocol spoken with the sale
//! server. It has no networking of its own.

pub mod clock;
pub mod error;
pub mod item;
pub mod protocol;
pub mod queue;
pub mod sale;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use item::{IdempotencyKey, ItemId, OpKind, QueueItem};
pub use queue::{OperationQueue, SharedQueue};
pub use sale::{SaleLine, SaleRequest};
pub use store::{JsonFileStore, MemoryStore, QueueStore};
