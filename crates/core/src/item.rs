// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending operations held by the offline queue.
//!
//! A [`QueueItem`] is a replayable snapshot of something the cashier did
//! while the server was unreachable. Items are persisted as camelCase JSON:
//!
//! ```text
//! {"id":1,"kind":"sale-creation","payload":{...},"enqueuedAt":"...",
//!  "attempts":0,"lastError":null,"idempotencyKey":"...","lastAttemptAt":null}
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Queue-local identifier, assigned at enqueue time and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    /// Returns the identifier that follows this one.
    pub fn next(self) -> ItemId {
        ItemId(self.0.saturating_add(1))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Client-generated token that makes replays of one item a single logical
/// operation on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        IdempotencyKey(Uuid::new_v4())
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for IdempotencyKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(IdempotencyKey)
            .map_err(|e| Error::InvalidInput(format!("invalid idempotency key '{s}': {e}")))
    }
}

/// The kind of operation an item replays.
///
/// New kinds are added as new variants; the tag of existing variants never
/// changes so previously persisted items keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpKind {
    /// Create a sale on the server.
    #[serde(alias = "sale_creation")]
    SaleCreation,
}

impl OpKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            OpKind::SaleCreation => "sale",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::SaleCreation => write!(f, "sale-creation"),
        }
    }
}

impl FromStr for OpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale-creation" | "sale_creation" | "sale" => Ok(OpKind::SaleCreation),
            _ => Err(Error::InvalidInput(format!(
                "invalid operation kind: '{s}'\n  hint: valid kinds are: sale-creation"
            ))),
        }
    }
}

/// A single pending operation awaiting confirmed delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: ItemId,
    pub kind: OpKind,
    /// Snapshot of the request body, frozen at enqueue time.
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
    /// Failed replay attempts so far.
    pub attempts: u32,
    pub last_error: Option<String>,
    pub idempotency_key: IdempotencyKey,
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Creates a fresh item that has never been attempted.
    pub fn new(
        id: ItemId,
        kind: OpKind,
        payload: serde_json::Value,
        idempotency_key: IdempotencyKey,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        QueueItem {
            id,
            kind,
            payload,
            enqueued_at,
            attempts: 0,
            last_error: None,
            idempotency_key,
            last_attempt_at: None,
        }
    }

    /// Returns true if at least one replay of this item has failed.
    pub fn has_failed(&self) -> bool {
        self.attempts > 0
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
