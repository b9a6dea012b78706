// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

use core::{
    convert::Infallible,
    sync::atomic::{AtomicU32, Ordering},
};

use super::TickHandler;
use crate::{error::Error, memory::status::PollBudget};

/// Owner of the global millisecond counter.
///
/// Lives in a `static`; the timer interrupt calls [`fire`](Self::fire) and the main loop reads
/// [`ticks`](Self::ticks).
pub struct Dispatcher {
    ticks: AtomicU32,
}

impl Dispatcher {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance the tick counter, then run every handler once, in slice order.
    pub fn fire(&self, handlers: &mut [&mut dyn TickHandler]) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        for handler in handlers.iter_mut() {
            handler.on_tick();
        }
    }

    /// Ticks since reset, wrapping.
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks elapsed since `start`, correct across one wrap of the counter.
    #[inline]
    pub fn elapsed_since(&self, start: u32) -> u32 {
        self.ticks().wrapping_sub(start)
    }

    /// Wait for `ms` ticks to pass.
    ///
    /// The wait reads the counter at most `budget` times. If the tick interrupt is not running
    /// the budget runs out and the result is [`Error::DeviceTimeout`].
    pub fn delay_ms(&self, ms: u32, budget: PollBudget) -> Result<(), Error<Infallible>> {
        let start = self.ticks();
        for _ in 0..budget.attempts() {
            if self.elapsed_since(start) >= ms {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(Error::DeviceTimeout)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
