// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is request/response keyed by idempotency key:
//! - Client submits an operation together with its key
//! - Server answers with `accepted` or `rejected` for that key
//!
//! A server that sees a key twice answers with the original `accepted`
//! (flagged `replayed`) instead of creating a second record.

use serde::{Deserialize, Serialize};

use crate::item::{IdempotencyKey, OpKind};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit an operation for creation.
    Submit {
        key: IdempotencyKey,
        kind: OpKind,
        payload: serde_json::Value,
    },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The operation for `key` exists on the server.
    Accepted {
        key: IdempotencyKey,
        /// Server-side identifier of the created record.
        record_id: String,
        /// True when the key had already been accepted before.
        #[serde(default)]
        replayed: bool,
    },

    /// The server refused the operation for `key`.
    Rejected {
        key: IdempotencyKey,
        /// Machine-readable reason, e.g. `validation`.
        code: String,
        /// Human-readable error description.
        message: String,
    },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error not tied to a submission.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Submit message.
    pub fn submit(key: IdempotencyKey, kind: OpKind, payload: serde_json::Value) -> Self {
        ClientMessage::Submit { key, kind, payload }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Accepted message.
    pub fn accepted(key: IdempotencyKey, record_id: impl Into<String>, replayed: bool) -> Self {
        ServerMessage::Accepted { key, record_id: record_id.into(), replayed }
    }

    /// Creates a Rejected message.
    pub fn rejected(
        key: IdempotencyKey,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ServerMessage::Rejected { key, code: code.into(), message: message.into() }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    /// The idempotency key this message answers, if any.
    pub fn key(&self) -> Option<&IdempotencyKey> {
        match self {
            ServerMessage::Accepted { key, .. } | ServerMessage::Rejected { key, .. } => Some(key),
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
