// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Half-duplex RS485 link on USART0.
//!
//! The transceiver direction pin is high while transmitting and low while listening. The green
//! TX LED is lit for the duration of each send.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::{
    config,
    error::Error,
    hw::{
        led::Led,
        transport::{self, ByteTransport},
    },
    timer::{Countdown, TickHandler},
};

/// Direction-pin settle time before the first byte, in microseconds.
const DIRECTION_SETTLE_US: u32 = 1_000;

pub struct Rs485<T, EN, D> {
    transport: T,
    en: EN,
    delay: D,
}

impl<T, EN, D> Rs485<T, EN, D>
where
    T: ByteTransport,
    EN: OutputPin,
    D: DelayNs,
{
    /// Take the transport, direction pin and delay. Starts in receive direction.
    pub fn new(transport: T, mut en: EN, delay: D) -> Self {
        en.set_low().ok();
        Self { transport, en, delay }
    }

    pub fn free(self) -> (T, EN, D) {
        (self.transport, self.en, self.delay)
    }

    /// Transmit `bytes` and wait for the line to drain, then return to receive.
    ///
    /// The direction pin and LED are restored even if the send fails.
    pub fn send<L: OutputPin>(&mut self, bytes: &[u8], tx_led: &mut Led<L>) -> Result<(), Error<T::Error>> {
        self.en.set_high().ok();
        tx_led.on();
        self.delay.delay_us(DIRECTION_SETTLE_US);

        let res = transport::send_blocking(&mut self.transport, bytes, config::TX_DRAIN_POLLS)
            .and_then(|()| transport::flush(&self.transport, config::TX_DRAIN_POLLS));

        tx_led.off();
        self.en.set_low().ok();

        if res.is_err() {
            log::warn!("rs485: send of {} bytes failed", bytes.len());
        }
        res
    }

    /// Take a received byte, if any.
    pub fn receive(&mut self) -> nb::Result<u8, T::Error> {
        self.transport.receive()
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Receive gap supervision: each byte reloads the timer; running out flags an
/// inter-character error.
#[derive(Debug, Default)]
pub struct InterCharTimer {
    gap: Countdown,
}

impl InterCharTimer {
    pub const fn new() -> Self {
        Self { gap: Countdown::new() }
    }

    /// A byte arrived.
    pub fn on_byte(&mut self) {
        self.gap.load(config::RS485_INTERCHAR_MS);
    }

    /// True while a frame is being received.
    pub fn in_frame(&self) -> bool {
        self.gap.is_running()
    }

    /// Consume the inter-character error flag.
    pub fn take_error(&mut self) -> bool {
        self.gap.take_expired()
    }
}

impl TickHandler for InterCharTimer {
    fn on_tick(&mut self) {
        self.gap.on_tick();
    }
}
