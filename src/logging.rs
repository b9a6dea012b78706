// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! `log` backend writing to a serial port.
//!
//! Records are formatted into a fixed-size line and queued on the attached [`Usart`]. Lines
//! longer than [`LINE_CAPACITY`] are truncated.
//!
//! ```ignore
//! static LOGGER: SerialLogger<Uart0> = SerialLogger::new(LevelFilter::Debug);
//!
//! LOGGER.attach(Usart::new(uart0));
//! log::set_logger(&LOGGER).ok();
//! log::set_max_level(LOGGER.level());
//! ```

use core::{cell::RefCell, fmt::Write};

use critical_section::Mutex;
use heapless::String;
use log::{LevelFilter, Log, Metadata, Record};

use crate::hw::{transport::ByteTransport, usart::Usart};

/// Longest formatted line, terminator included.
pub const LINE_CAPACITY: usize = 128;

pub struct SerialLogger<T: ByteTransport> {
    usart: Mutex<RefCell<Option<Usart<T>>>>,
    level: LevelFilter,
}

impl<T: ByteTransport> SerialLogger<T> {
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            usart: Mutex::new(RefCell::new(None)),
            level,
        }
    }

    #[inline]
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Start writing records to `usart`.
    pub fn attach(&self, usart: Usart<T>) {
        critical_section::with(|cs| {
            self.usart.borrow_ref_mut(cs).replace(usart);
        });
    }

    /// Stop logging and hand the port back.
    pub fn detach(&self) -> Option<Usart<T>> {
        critical_section::with(|cs| self.usart.borrow_ref_mut(cs).take())
    }

    fn with_usart(&self, f: impl FnOnce(&mut Usart<T>)) {
        // The port is taken out for the write so the transmit interrupt can run. Records
        // logged in the meantime are dropped.
        let Some(mut usart) = critical_section::with(|cs| self.usart.borrow_ref_mut(cs).take()) else {
            return;
        };
        f(&mut usart);
        critical_section::with(|cs| {
            self.usart.borrow_ref_mut(cs).replace(usart);
        });
    }
}

/// Format one record as `[LEVEL target] message\r\n`.
pub fn format_record(record: &Record<'_>) -> String<LINE_CAPACITY> {
    let mut line = String::new();
    // Overflow truncates the message; the terminator is still appended below.
    let _ = write!(
        line,
        "[{:<5} {}] {}",
        record.level(),
        record.target(),
        record.args()
    );
    while line.len() > LINE_CAPACITY - 2 {
        line.pop();
    }
    let _ = line.push_str("\r\n");
    line
}

impl<T> Log for SerialLogger<T>
where
    T: ByteTransport + Send,
{
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_record(record);
        self.with_usart(|usart| {
            let _ = usart.send(line.as_bytes());
        });
    }

    fn flush(&self) {
        self.with_usart(|usart| usart.flush());
    }
}
