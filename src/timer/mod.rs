// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond tick dispatch.
//!
//! One hardware timer fires every millisecond. Its interrupt calls [`Dispatcher::fire`] with
//! the board's handlers in a fixed order. Each handler owns its own counters and does O(1),
//! non-blocking work per tick.

pub mod countdown;
pub mod dispatcher;

pub use countdown::{Blinker, Countdown, HoldTimer, PeriodicFlag, Stopwatch};
pub use dispatcher::Dispatcher;

/// Periodic work run once per timer tick.
pub trait TickHandler {
    fn on_tick(&mut self);
}
