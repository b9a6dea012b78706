// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer.
//!
//! - `TxQueue` is the interrupt-drained transmit buffer behind UART0 and USART0. `load` copies a
//!   message in; the transmit-ready interrupt pulls one byte at a time and the
//!   transmitter-empty interrupt marks the queue ready again.
//! - `RxLatch` holds the last received byte until the main loop takes it.
//! - `Usart` provides several printing helpers for hex, decimal, and ASCII strings over any
//!   [`ByteTransport`].
//!
//! Note: When using `writeln!`, be sure to include `\r` (CR) in the format string to ensure correct
//! line endings on the terminal.

use core::fmt;

use heapless::Vec;

use crate::{
    config,
    error::Error,
    hw::transport::{self, ByteTransport},
};

/// Message longer than the transmit buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TxOverflow;

/// Fixed-capacity transmit buffer drained from interrupt context.
pub struct TxQueue<const N: usize> {
    buf: Vec<u8, N>,
    next: usize,
    ready: bool,
}

impl<const N: usize> TxQueue<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            next: 0,
            ready: true,
        }
    }

    /// Copy `bytes` in for transmission.
    ///
    /// `WouldBlock` while the previous message is still draining.
    pub fn load(&mut self, bytes: &[u8]) -> nb::Result<(), TxOverflow> {
        if !self.ready {
            return Err(nb::Error::WouldBlock);
        }
        if bytes.is_empty() {
            return Ok(());
        }

        self.buf.clear();
        self.buf
            .extend_from_slice(bytes)
            .map_err(|_| nb::Error::Other(TxOverflow))?;
        self.next = 0;
        self.ready = false;
        Ok(())
    }

    /// Transmit-ready interrupt: next byte to write, `None` once the buffer is drained.
    ///
    /// On `None` the caller disables the transmit-ready interrupt and waits for
    /// transmitter-empty.
    pub fn on_tx_ready(&mut self) -> Option<u8> {
        let b = self.buf.get(self.next).copied()?;
        self.next += 1;
        Some(b)
    }

    /// Transmitter-empty interrupt.
    pub fn on_tx_empty(&mut self) {
        if self.next >= self.buf.len() {
            self.ready = true;
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Bytes not yet handed to the transmitter.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buf.len() - self.next
    }
}

impl<const N: usize> Default for TxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-byte receive latch.
#[derive(Default)]
pub struct RxLatch {
    byte: Option<u8>,
    overrun: bool,
}

impl RxLatch {
    pub const fn new() -> Self {
        Self {
            byte: None,
            overrun: false,
        }
    }

    /// Receive interrupt. A byte not yet taken is overwritten.
    pub fn on_rx(&mut self, b: u8) {
        if self.byte.is_some() {
            self.overrun = true;
        }
        self.byte = Some(b);
    }

    pub fn take(&mut self) -> Option<u8> {
        self.byte.take()
    }

    /// True if a byte was lost since the last call.
    pub fn take_overrun(&mut self) -> bool {
        core::mem::take(&mut self.overrun)
    }
}

pub struct Usart<T: ByteTransport> {
    tx: T,
}

impl<T: ByteTransport> Usart<T> {
    pub fn new(tx: T) -> Self {
        Self { tx }
    }

    /// Queue `bytes` in buffer-sized pieces.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), Error<T::Error>> {
        for piece in bytes.chunks(config::UART_TX_CAPACITY) {
            transport::send_blocking(&mut self.tx, piece, config::TX_DRAIN_POLLS)?;
        }
        Ok(())
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = self.send(&[b]);
    }

    pub fn write_str(&mut self, s: &str) {
        let _ = self.send(s.as_bytes());
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the transmitter has drained.
    #[inline]
    pub fn flush(&mut self) {
        let _ = transport::flush(&self.tx, config::TX_DRAIN_POLLS);
    }

    pub fn print_hex_u8(&mut self, n: u8) {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let digits = [b'0', b'x', HEX[((n >> 4) & 0xF) as usize], HEX[(n & 0xF) as usize]];
        let _ = self.send(&digits);
    }

    pub fn print_hex_u32(&mut self, n: u32) {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let mut out: Vec<u8, 11> = Vec::new();
        out.extend_from_slice(b"0x").ok();
        for (i, shift) in (0..=28).rev().step_by(4).enumerate() {
            if i == 4 {
                out.push(b'_').ok();
            }
            out.push(HEX[((n >> shift) & 0xF) as usize]).ok();
        }
        let _ = self.send(&out);
    }

    pub fn print_u32(&mut self, mut n: u32) {
        let mut buf = [0u8; 10];
        let mut i = buf.len();
        if n == 0 {
            self.write_byte(b'0');
            return;
        }
        while n > 0 {
            i -= 1;
            buf[i] = b'0' + (n % 10) as u8;
            n /= 10;
        }
        let _ = self.send(&buf[i..]);
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.tx
    }

    pub fn free(self) -> T {
        self.tx
    }
}

// Implement `core::fmt::Write` so we can use `write!` / `writeln!` on `Usart`.
impl<T: ByteTransport> fmt::Write for Usart<T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.send(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
