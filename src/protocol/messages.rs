// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Framing bytes and commands of the serial configuration links.
//!
//! Both the RTC time-set frames on UART0 and the configuration frames on USB are delimited by
//! `#` and `$`. Time-set field bytes are binary values, not ASCII digits.

/// Start of frame.
pub const START_BYTE: u8 = b'#';
/// End of frame.
pub const END_BYTE: u8 = b'$';
/// Byte returned by the USB link while no host is attached.
pub const NO_LINK: u8 = 0xAA;

/// Tag of a time frame: `#T<hours><minutes><seconds>$`.
pub const TIME_TAG: &[u8] = b"T";
/// Tag of a date frame: `#DT<date><month><year><day>$`.
pub const DATE_TAG: &[u8] = b"DT";

/// Clock update received over the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSetCommand {
    Time { hours: u8, minutes: u8, seconds: u8 },
    /// `day` is the day of the week, 1 (Sunday) to 7.
    Date { date: u8, month: u8, year: u8, day: u8 },
}

impl TimeSetCommand {
    /// Fields are within the clock's ranges.
    pub fn is_valid(&self) -> bool {
        match *self {
            TimeSetCommand::Time {
                hours,
                minutes,
                seconds,
            } => hours < 24 && minutes < 60 && seconds < 60,
            TimeSetCommand::Date {
                date,
                month,
                year,
                day,
            } => (1..=31).contains(&date) && (1..=12).contains(&month) && year < 100 && (1..=7).contains(&day),
        }
    }
}
