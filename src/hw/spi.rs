// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial Peripheral Interface (SPI) abstraction layer.
//!
//! - `SpiBus` wraps any `embedded-hal` SPI bus with 8-bit words and hands out exclusive
//!   [`Transaction`]s.
//! - `ChipSelect` is an active-low GPIO output wrapper for manual CS control.
//!
//! A `Transaction` asserts its chip-select when created and deasserts it when dropped, so a
//! device can never be left selected on an early return. The guard borrows the bus mutably,
//! which rules out a second transaction at compile time. If a guard is leaked with
//! `mem::forget`, the bus stays marked in flight and the next `begin` fails with
//! [`Error::TransportBusy`] until [`SpiBus::recover`] is called.

use embedded_hal::{digital::OutputPin, spi::SpiBus as HalSpiBus};

use crate::error::Error;

/// Wrapper around a configured SPI bus (8-bit words).
pub struct SpiBus<SPI> {
    spi: SPI,
    in_flight: bool,
}

impl<SPI> SpiBus<SPI>
where
    SPI: HalSpiBus<u8>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi, in_flight: false }
    }

    /// Select `cs` and start an exclusive transaction.
    pub fn begin<'a, CS: OutputPin>(
        &'a mut self,
        cs: &'a mut ChipSelect<CS>,
    ) -> Result<Transaction<'a, SPI, CS>, Error<SPI::Error>> {
        if self.in_flight {
            return Err(Error::TransportBusy);
        }
        self.in_flight = true;
        cs.select();
        Ok(Transaction { bus: self, cs })
    }

    /// True while a transaction holds the bus.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Clear the in-flight mark left by a leaked transaction.
    pub fn recover(&mut self) {
        self.in_flight = false;
    }

    pub fn free(self) -> SPI {
        self.spi
    }
}

/// An open SPI transaction with one chip-select asserted.
pub struct Transaction<'a, SPI, CS>
where
    SPI: HalSpiBus<u8>,
    CS: OutputPin,
{
    bus: &'a mut SpiBus<SPI>,
    cs: &'a mut ChipSelect<CS>,
}

impl<SPI, CS> Transaction<'_, SPI, CS>
where
    SPI: HalSpiBus<u8>,
    CS: OutputPin,
{
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), SPI::Error> {
        self.bus.spi.write(bytes)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), SPI::Error> {
        buf.fill(0xFF);
        self.bus.spi.transfer_in_place(buf)
    }
}

impl<SPI, CS> Drop for Transaction<'_, SPI, CS>
where
    SPI: HalSpiBus<u8>,
    CS: OutputPin,
{
    fn drop(&mut self) {
        self.bus.spi.flush().ok();
        self.cs.deselect();
        self.bus.in_flight = false;
    }
}

/// Manual chip-select line, active-low, generic over any GPIO pin.
pub struct ChipSelect<PIN> {
    pin: PIN,
}

impl<PIN: OutputPin> ChipSelect<PIN> {
    /// Create an active-low chip select and set to the inactive state (i.e., high).
    pub fn active_low(mut pin: PIN) -> Self {
        pin.set_high().ok();
        Self { pin }
    }

    /// Assert the chip select.
    #[inline]
    pub fn select(&mut self) {
        self.pin.set_low().ok();
    }

    /// Deassert the chip select.
    #[inline]
    pub fn deselect(&mut self) {
        self.pin.set_high().ok();
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}
