// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! The board's tick handlers, composed in dispatch order.

use crate::{
    config,
    drivers::rs485::InterCharTimer,
    hw::input::DigitalInputs,
    protocol::usb_frame::FrameReceiver,
    timer::{Blinker, Countdown, Dispatcher, HoldTimer, PeriodicFlag, Stopwatch, TickHandler},
};

/// Number of handlers run on every tick.
pub const HANDLER_COUNT: usize = 7 + config::MOMENTARY_OUTPUTS;

/// Everything the 1 ms interrupt advances.
pub struct SystemTimers {
    pub inputs: DigitalInputs,
    pub rs485_gap: InterCharTimer,
    /// Raised once per second.
    pub general: PeriodicFlag,
    /// Generic delay count.
    pub delay: Countdown,
    pub usb_frame: FrameReceiver,
    /// Pulse length of each momentary output.
    pub momentary: [Stopwatch; config::MOMENTARY_OUTPUTS],
    /// On-board key held for the default-IP reset.
    pub key_hold: HoldTimer,
    /// Default-IP acknowledgement LED.
    pub blinker: Blinker,
}

impl SystemTimers {
    pub const fn new() -> Self {
        Self {
            inputs: DigitalInputs::new(),
            rs485_gap: InterCharTimer::new(),
            general: PeriodicFlag::new(config::GENERAL_PERIOD_MS),
            delay: Countdown::new(),
            usb_frame: FrameReceiver::new(),
            momentary: [Stopwatch::new(), Stopwatch::new(), Stopwatch::new(), Stopwatch::new()],
            key_hold: HoldTimer::new(config::DEFAULT_IP_HOLD_MS),
            blinker: Blinker::new(config::DEFAULT_IP_LED_ON_MS, config::DEFAULT_IP_LED_OFF_MS),
        }
    }

    /// All handlers, in the order they run on each tick.
    pub fn handlers(&mut self) -> [&mut dyn TickHandler; HANDLER_COUNT] {
        let [m1, m2, m3, m4] = &mut self.momentary;
        [
            &mut self.inputs,
            &mut self.rs485_gap,
            &mut self.general,
            &mut self.delay,
            &mut self.usb_frame,
            m1,
            m2,
            m3,
            m4,
            &mut self.key_hold,
            &mut self.blinker,
        ]
    }

    /// Run one tick through `dispatcher`.
    pub fn tick(&mut self, dispatcher: &Dispatcher) {
        dispatcher.fire(&mut self.handlers());
    }
}

impl Default for SystemTimers {
    fn default() -> Self {
        Self::new()
    }
}
