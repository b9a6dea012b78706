// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Raw byte transport contract.
//!
//! UART0, USART0 (RS485) and the USB CDC link all move raw bytes with a busy/ready
//! handshake. The board implements [`ByteTransport`] on top of its peripherals; drivers and
//! tests only see the trait. The blocking helpers bound every wait with a [`PollBudget`].

use crate::{error::Error, memory::status::PollBudget};

/// A byte pipe with a single outstanding transmission.
pub trait ByteTransport {
    type Error;

    /// Queue `bytes` for transmission.
    ///
    /// Returns `WouldBlock` while a previous transmission is still draining.
    fn send(&mut self, bytes: &[u8]) -> nb::Result<(), Self::Error>;

    /// True once the last queued byte has left the transmitter.
    fn transmit_complete(&self) -> bool;

    /// Take one received byte, `WouldBlock` if none is pending.
    fn receive(&mut self) -> nb::Result<u8, Self::Error>;

    /// True when a new transmission may be queued.
    fn is_ready(&self) -> bool;
}

/// Queue `bytes`, retrying while the transport is busy.
///
/// Gives [`Error::TransportBusy`] if the previous transmission never releases the buffer.
pub fn send_blocking<T: ByteTransport>(
    transport: &mut T,
    bytes: &[u8],
    budget: PollBudget,
) -> Result<(), Error<T::Error>> {
    for _ in 0..budget.attempts() {
        match transport.send(bytes) {
            Ok(()) => return Ok(()),
            Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
            Err(nb::Error::Other(e)) => return Err(Error::Bus(e)),
        }
    }
    Err(Error::TransportBusy)
}

/// Wait until the transmitter is empty.
pub fn flush<T: ByteTransport>(transport: &T, budget: PollBudget) -> Result<(), Error<T::Error>> {
    for _ in 0..budget.attempts() {
        if transport.transmit_complete() {
            return Ok(());
        }
        core::hint::spin_loop();
    }
    Err(Error::DeviceTimeout)
}

/// Fill `buf` from the transport, spending at most `budget` polls per byte.
pub fn receive_exact<T: ByteTransport>(
    transport: &mut T,
    buf: &mut [u8],
    budget: PollBudget,
) -> Result<(), Error<T::Error>> {
    for slot in buf.iter_mut() {
        *slot = receive_byte(transport, budget)?;
    }
    Ok(())
}

fn receive_byte<T: ByteTransport>(transport: &mut T, budget: PollBudget) -> Result<u8, Error<T::Error>> {
    for _ in 0..budget.attempts() {
        match transport.receive() {
            Ok(b) => return Ok(b),
            Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
            Err(nb::Error::Other(e)) => return Err(Error::Bus(e)),
        }
    }
    Err(Error::DeviceTimeout)
}
