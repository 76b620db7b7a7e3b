// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn instant(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap()
}

#[test]
fn manual_clock_is_frozen_until_advanced() {
    let clock = ManualClock::at(instant(1_000));
    assert_eq!(clock.now(), instant(1_000));
    assert_eq!(clock.now(), instant(1_000));

    clock.advance(Duration::milliseconds(250));
    assert_eq!(clock.now(), instant(1_250));
}

#[test]
fn manual_clock_set_jumps() {
    let clock = ManualClock::default();
    clock.set(instant(42_000));
    assert_eq!(clock.now().timestamp_millis(), 42_000);
}

#[test]
fn clock_through_reference_and_arc() {
    let clock = ManualClock::at(instant(5));
    let by_ref = &clock;
    assert_eq!(ClockSource::now(&by_ref), instant(5));

    let shared = std::sync::Arc::new(ManualClock::at(instant(7)));
    assert_eq!(ClockSource::now(&shared), instant(7));
}

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
