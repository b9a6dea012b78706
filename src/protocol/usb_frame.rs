// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Length-checked configuration frames from the USB CDC link.
//!
//! A frame starts with `#` and must be received within the frame timeout. Bytes 3 and 4 of
//! the frame hold its total length (start and end bytes included), big-endian. A `$` only ends
//! the frame when the length so far matches; otherwise it is ordinary data.

use heapless::Vec;

use crate::{
    config,
    protocol::messages::{END_BYTE, NO_LINK, START_BYTE},
    timer::{Countdown, TickHandler},
};

/// Offset of the big-endian length field.
const LENGTH_OFFSET: usize = 3;

pub struct FrameReceiver {
    buf: Vec<u8, { config::USB_FRAME_CAPACITY }>,
    in_frame: bool,
    complete: bool,
    no_link: bool,
    timed_out: bool,
    timer: Countdown,
}

impl FrameReceiver {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            in_frame: false,
            complete: false,
            no_link: false,
            timed_out: false,
            timer: Countdown::new(),
        }
    }

    /// Feed one received byte. Returns true when it completed a frame.
    pub fn push(&mut self, byte: u8) -> bool {
        if !self.in_frame {
            match byte {
                START_BYTE => self.start(),
                NO_LINK => self.no_link = true,
                _ => {}
            }
            return false;
        }

        if self.buf.push(byte).is_err() {
            log::warn!("usb: frame overflow, dropped");
            self.abort();
            return false;
        }

        if byte == END_BYTE && self.declared_len() == Some(self.buf.len()) {
            self.in_frame = false;
            self.complete = true;
            self.timer.cancel();
            return true;
        }
        false
    }

    fn start(&mut self) {
        self.buf.clear();
        // Capacity is non-zero, the push cannot fail.
        let _ = self.buf.push(START_BYTE);
        self.in_frame = true;
        self.complete = false;
        self.no_link = false;
        self.timer.load(config::USB_FRAME_TIMEOUT_MS);
    }

    fn abort(&mut self) {
        self.in_frame = false;
        self.buf.clear();
        self.timer.cancel();
    }

    /// Length carried in the frame header, once received.
    pub fn declared_len(&self) -> Option<usize> {
        let hi = *self.buf.get(LENGTH_OFFSET)?;
        let lo = *self.buf.get(LENGTH_OFFSET + 1)?;
        Some(usize::from(u16::from_be_bytes([hi, lo])))
    }

    /// The last complete frame, start and end bytes included.
    pub fn frame(&self) -> Option<&[u8]> {
        self.complete.then_some(self.buf.as_slice())
    }

    /// Drop the completed frame once it has been handled.
    pub fn release(&mut self) {
        if self.complete {
            self.complete = false;
            self.buf.clear();
        }
    }

    #[inline]
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Consume the "no host attached" flag.
    pub fn take_no_link(&mut self) -> bool {
        core::mem::take(&mut self.no_link)
    }

    /// Consume the frame-timeout flag.
    pub fn take_timeout(&mut self) -> bool {
        core::mem::take(&mut self.timed_out)
    }
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl TickHandler for FrameReceiver {
    fn on_tick(&mut self) {
        self.timer.on_tick();
        if self.timer.take_expired() && self.in_frame {
            self.abort();
            self.timed_out = true;
        }
    }
}
