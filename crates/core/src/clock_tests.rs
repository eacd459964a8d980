// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let before = clock.epoch_ms();
    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.epoch_ms(), before + 250);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let clone = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(clone.epoch_ms(), clock.epoch_ms());
}

#[test]
fn system_clock_is_nonzero() {
    assert!(SystemClock.epoch_ms() > 0);
}
