// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Watchdog timer counter values.
//!
//! The watchdog counts down a 12-bit value at slow clock / 128. A fault resets the processor
//! unless the counter is restarted first.

/// Slow-clock prescaler in front of the watchdog counter.
const PRESCALER: u32 = 128;
/// Largest counter value (WDV field width).
const MAX_COUNTS: u32 = 0xFFF;

/// Counter reload producing a given reset period.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WatchdogConfig {
    /// WDV: counter reload value.
    pub counts: u16,
}

impl WatchdogConfig {
    /// Reload value for a `period_ms` timeout.
    ///
    /// `None` when the period is shorter than one counter step or longer than the counter holds.
    pub fn for_period(period_ms: u32, slow_clock: u32) -> Option<Self> {
        let counts = u64::from(period_ms) * u64::from(slow_clock) / (u64::from(PRESCALER) * 1_000);
        if counts == 0 || counts > u64::from(MAX_COUNTS) {
            return None;
        }
        Some(Self { counts: counts as u16 })
    }

    /// Period actually produced, rounded down to whole milliseconds.
    pub fn period_ms(&self, slow_clock: u32) -> u32 {
        (u64::from(self.counts) * u64::from(PRESCALER) * 1_000 / u64::from(slow_clock)) as u32
    }
}
