// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

fn key() -> IdempotencyKey {
    "6f1d2c3b-4a5e-4f60-8a7b-9c0d1e2f3a4b".parse().unwrap()
}

#[parameterized(
    submit = { ClientMessage::submit(key(), OpKind::SaleCreation, json!({"total": 40.0})) },
    ping = { ClientMessage::ping(12345) },
)]
fn client_message_roundtrip(msg: ClientMessage) {
    let json = msg.to_json().unwrap();
    let parsed = ClientMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[parameterized(
    accepted = { ServerMessage::accepted(key(), "sale-991", false) },
    replayed = { ServerMessage::accepted(key(), "sale-991", true) },
    rejected = { ServerMessage::rejected(key(), "validation", "unknown sku") },
    pong = { ServerMessage::pong(7) },
    error = { ServerMessage::error("overloaded") },
)]
fn server_message_roundtrip(msg: ServerMessage) {
    let json = msg.to_json().unwrap();
    let parsed = ServerMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[test]
fn submit_wire_format() {
    let msg = ClientMessage::submit(key(), OpKind::SaleCreation, json!({"total": 40.0}));
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(value["type"], "submit");
    assert_eq!(value["key"], "6f1d2c3b-4a5e-4f60-8a7b-9c0d1e2f3a4b");
    assert_eq!(value["kind"], "sale-creation");
    assert_eq!(value["payload"]["total"], 40.0);
}

#[test]
fn accepted_without_replayed_flag_defaults_false() {
    let json = r#"{"type":"accepted","key":"6f1d2c3b-4a5e-4f60-8a7b-9c0d1e2f3a4b","record_id":"s-1"}"#;
    let msg = ServerMessage::from_json(json).unwrap();
    assert_eq!(msg, ServerMessage::accepted(key(), "s-1", false));
}

#[test]
fn server_message_key() {
    assert_eq!(ServerMessage::accepted(key(), "s", false).key(), Some(&key()));
    assert_eq!(ServerMessage::rejected(key(), "c", "m").key(), Some(&key()));
    assert_eq!(ServerMessage::pong(1).key(), None);
    assert_eq!(ServerMessage::error("x").key(), None);
}

#[test]
fn unknown_message_type_is_an_error() {
    assert!(ServerMessage::from_json(r#"{"type":"snapshot"}"#).is_err());
}
