// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_reads_wall_time() {
    let first = SystemClock.epoch_ms();
    // Sometime after 2020; monotonic enough for back-to-back reads.
    assert!(first > 1_600_000_000_000);
    assert!(SystemClock.epoch_ms() >= first);
}

#[test]
fn fake_clock_moves_only_when_told() {
    let clock = FakeClock::new();
    let start = clock.epoch_ms();
    assert_eq!(clock.epoch_ms(), start);

    clock.advance_ms(250);
    assert_eq!(clock.epoch_ms(), start + 250);

    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn fake_clock_clones_share_the_reading() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance_ms(10);
    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}
