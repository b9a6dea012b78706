// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Tick-driven counters.
//!
//! Each type is a self-contained [`TickHandler`]: the interrupt advances it and the main loop
//! reads or consumes its flags.

use super::TickHandler;

/// One-shot countdown. Reaching zero latches an expiry flag.
#[derive(Debug, Default)]
pub struct Countdown {
    remaining: u32,
    expired: bool,
}

impl Countdown {
    pub const fn new() -> Self {
        Self {
            remaining: 0,
            expired: false,
        }
    }

    /// Start (or restart) the countdown at `ticks`. Loading 0 stops it.
    pub fn load(&mut self, ticks: u32) {
        self.remaining = ticks;
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.remaining > 0
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume the expiry flag.
    pub fn take_expired(&mut self) -> bool {
        core::mem::take(&mut self.expired)
    }
}

impl TickHandler for Countdown {
    fn on_tick(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.expired = true;
            }
        }
    }
}

/// Raises a flag every `period` ticks.
#[derive(Debug)]
pub struct PeriodicFlag {
    period: u32,
    count: u32,
    flag: bool,
}

impl PeriodicFlag {
    pub const fn new(period: u32) -> Self {
        Self {
            period,
            count: 0,
            flag: false,
        }
    }

    pub fn take(&mut self) -> bool {
        core::mem::take(&mut self.flag)
    }
}

impl TickHandler for PeriodicFlag {
    fn on_tick(&mut self) {
        self.count += 1;
        if self.count >= self.period {
            self.count = 0;
            self.flag = true;
        }
    }
}

/// Counts ticks while running.
#[derive(Debug, Default)]
pub struct Stopwatch {
    elapsed: u32,
    running: bool,
}

impl Stopwatch {
    pub const fn new() -> Self {
        Self {
            elapsed: 0,
            running: false,
        }
    }

    /// Restart from zero.
    pub fn start(&mut self) {
        self.elapsed = 0;
        self.running = true;
    }

    /// Stop and return the elapsed ticks.
    pub fn stop(&mut self) -> u32 {
        self.running = false;
        self.elapsed
    }

    #[inline]
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl TickHandler for Stopwatch {
    fn on_tick(&mut self) {
        if self.running {
            self.elapsed = self.elapsed.saturating_add(1);
        }
    }
}

/// Fires once after being held armed for `threshold` ticks.
///
/// Used for the on-board key: holding it for the threshold restores the default IP settings.
/// Releasing resets the count; it does not fire again until released and re-armed.
#[derive(Debug)]
pub struct HoldTimer {
    threshold: u32,
    held: u32,
    armed: bool,
    fired: bool,
    latched: bool,
}

impl HoldTimer {
    pub const fn new(threshold: u32) -> Self {
        Self {
            threshold,
            held: 0,
            armed: false,
            fired: false,
            latched: false,
        }
    }

    /// Key pressed.
    pub fn arm(&mut self) {
        if !self.armed {
            self.armed = true;
            self.held = 0;
        }
    }

    /// Key released.
    pub fn release(&mut self) {
        self.armed = false;
        self.held = 0;
        self.latched = false;
    }

    #[inline]
    pub fn held(&self) -> u32 {
        self.held
    }

    pub fn take_fired(&mut self) -> bool {
        core::mem::take(&mut self.fired)
    }
}

impl TickHandler for HoldTimer {
    fn on_tick(&mut self) {
        if !self.armed || self.latched {
            return;
        }
        self.held += 1;
        if self.held >= self.threshold {
            self.fired = true;
            self.latched = true;
        }
    }
}

/// Alternates lit and unlit phases for a number of cycles.
#[derive(Debug)]
pub struct Blinker {
    on_ticks: u32,
    off_ticks: u32,
    count: u32,
    cycles_left: u32,
    lit: bool,
}

impl Blinker {
    pub const fn new(on_ticks: u32, off_ticks: u32) -> Self {
        Self {
            on_ticks,
            off_ticks,
            count: 0,
            cycles_left: 0,
            lit: false,
        }
    }

    /// Blink `cycles` times, starting lit.
    pub fn start(&mut self, cycles: u32) {
        self.count = 0;
        self.cycles_left = cycles;
        self.lit = cycles > 0;
    }

    pub fn stop(&mut self) {
        self.cycles_left = 0;
        self.lit = false;
    }

    #[inline]
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.cycles_left > 0
    }
}

impl TickHandler for Blinker {
    fn on_tick(&mut self) {
        if self.cycles_left == 0 {
            return;
        }
        self.count += 1;
        if self.lit && self.count >= self.on_ticks {
            self.lit = false;
            self.count = 0;
        } else if !self.lit && self.count >= self.off_ticks {
            self.count = 0;
            self.cycles_left -= 1;
            self.lit = self.cycles_left > 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(h: &mut dyn TickHandler, n: u32) {
        for _ in 0..n {
            h.on_tick();
        }
    }

    #[test]
    fn countdown_expires_once() {
        let mut c = Countdown::new();
        c.load(20);
        run(&mut c, 19);
        assert!(c.is_running());
        assert!(!c.take_expired());
        run(&mut c, 1);
        assert!(!c.is_running());
        assert!(c.take_expired());
        run(&mut c, 50);
        assert!(!c.take_expired());
    }

    #[test]
    fn countdown_reload_postpones_expiry() {
        let mut c = Countdown::new();
        c.load(20);
        run(&mut c, 15);
        c.load(20);
        run(&mut c, 15);
        assert!(!c.take_expired());
        run(&mut c, 5);
        assert!(c.take_expired());
    }

    #[test]
    fn periodic_flag_every_period() {
        let mut p = PeriodicFlag::new(1000);
        run(&mut p, 999);
        assert!(!p.take());
        run(&mut p, 1);
        assert!(p.take());
        assert!(!p.take());
        run(&mut p, 1000);
        assert!(p.take());
    }

    #[test]
    fn stopwatch_counts_only_while_running() {
        let mut s = Stopwatch::new();
        run(&mut s, 10);
        assert_eq!(s.elapsed(), 0);
        s.start();
        run(&mut s, 250);
        assert_eq!(s.stop(), 250);
        run(&mut s, 10);
        assert_eq!(s.elapsed(), 250);
    }

    #[test]
    fn hold_timer_fires_once_per_press() {
        let mut h = HoldTimer::new(5000);
        h.arm();
        run(&mut h, 4999);
        assert!(!h.take_fired());
        run(&mut h, 1);
        assert!(h.take_fired());
        run(&mut h, 10_000);
        assert!(!h.take_fired());

        h.release();
        h.arm();
        run(&mut h, 2000);
        h.release();
        run(&mut h, 5000);
        assert!(!h.take_fired());
    }

    #[test]
    fn blinker_runs_requested_cycles() {
        let mut b = Blinker::new(500, 500);
        b.start(2);
        assert!(b.is_lit());
        run(&mut b, 500);
        assert!(!b.is_lit());
        run(&mut b, 500);
        assert!(b.is_lit());
        run(&mut b, 1000);
        assert!(!b.is_lit());
        assert!(!b.is_active());
        run(&mut b, 1000);
        assert!(!b.is_lit());
    }
}
