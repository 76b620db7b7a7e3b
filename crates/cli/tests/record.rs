// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

#[test]
fn offline_sale_is_saved() {
    let till = offline_till();

    tillq(&till)
        .args(["record", "--item", "A1:2", "--total", "40.00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sale saved offline, 1 sale pending sync"));

    tillq(&till)
        .args(["record", "-i", "B7", "-t", "3.50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 sales pending sync"));
}

#[test]
fn online_sale_is_sent() {
    let till = offline_till();
    let url = start_server();

    tillq(&till)
        .env("TILLQ_REMOTE_URL", &url)
        .args(["record", "--item", "A1:2", "--total", "40.00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sale sent as sale-1"));

    tillq(&till)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sales pending sync."));
}

#[test]
fn invalid_item_is_rejected() {
    let till = offline_till();

    tillq(&till)
        .args(["record", "--item", "A1:lots", "--total", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid quantity in 'A1:lots'"));

    tillq(&till)
        .args(["record", "--item", "A1", "--total", "-2"])
        .assert()
        .failure();

    tillq(&till)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sales pending sync."));
}

#[test]
fn record_requires_an_item() {
    let till = offline_till();
    tillq(&till).args(["record", "--total", "1"]).assert().failure();
}
