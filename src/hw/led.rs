// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board LEDs.
//!
//! All three indicator LEDs on the board are wired active-low. [`Led`] tracks the logical state
//! so callers never deal with pin polarity.

use embedded_hal::digital::{OutputPin, PinState};

/// An indicator LED on one GPIO output.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    /// Pin level that lights the LED.
    lit_level: PinState,
    lit: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    fn with_level(pin: PIN, lit_level: PinState) -> Self {
        let mut led = Self {
            pin,
            lit_level,
            lit: true,
        };
        led.set(false);
        led
    }

    /// LED lit when the pin is high. Starts off.
    pub fn active_high(pin: PIN) -> Self {
        Self::with_level(pin, PinState::High)
    }

    /// LED lit when the pin is low. Starts off.
    pub fn active_low(pin: PIN) -> Self {
        Self::with_level(pin, PinState::Low)
    }

    /// Light (`true`) or darken (`false`) the LED.
    pub fn set(&mut self, lit: bool) {
        let level = if lit { self.lit_level } else { !self.lit_level };
        self.pin.set_state(level).ok();
        self.lit = lit;
    }

    #[inline]
    pub fn on(&mut self) {
        self.set(true);
    }

    #[inline]
    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.lit);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.lit
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}

/// The board's indicator LEDs: power (red, PA18), RS485 receive (yellow, PA19) and RS485
/// transmit (green, PB11).
pub struct StatusLeds<P, R, T>
where
    P: OutputPin,
    R: OutputPin,
    T: OutputPin,
{
    pub power: Led<P>,
    pub rx: Led<R>,
    pub tx: Led<T>,
}

impl<P, R, T> StatusLeds<P, R, T>
where
    P: OutputPin,
    R: OutputPin,
    T: OutputPin,
{
    /// Wrap the three pins, all off.
    pub fn new(power: P, rx: R, tx: T) -> Self {
        Self {
            power: Led::active_low(power),
            rx: Led::active_low(rx),
            tx: Led::active_low(tx),
        }
    }

    pub fn all_off(&mut self) {
        self.power.off();
        self.rx.off();
        self.tx.off();
    }
}
