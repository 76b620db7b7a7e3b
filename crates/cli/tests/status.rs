// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

#[test]
fn status_offline_and_empty() {
    let till = offline_till();

    tillq(&till)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("remote: ws://127.0.0.1:1 (offline)"))
        .stdout(predicate::str::contains("pending: none"));
}

#[test]
fn status_json() {
    let till = offline_till();
    record(&till, "A1:2", "40");

    let output = tillq(&till).args(["status", "-o", "json"]).output().unwrap();
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["connectivity"], "offline");
    assert_eq!(status["pending"], 1);
    assert_eq!(status["remote"], UNREACHABLE_URL);
}

#[test]
fn status_online() {
    let till = offline_till();
    let url = start_server();

    tillq(&till)
        .env("TILLQ_REMOTE_URL", &url)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("(online)"));
}
