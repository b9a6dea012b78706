// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! DS1339A I2C real-time clock.
//!
//! Time and date live in BCD registers 0x00..=0x06. Alarm 1 is programmed to fire once per
//! second; its SQW/INT output pulls an input pin low and the status register latches the alarm
//! flag until it is written back as zero. [`RtcMonitor`] turns those alarms into date/time reads.

use core::{fmt, ops::RangeInclusive};

use embedded_hal::i2c::I2c;

use crate::{config, error::Error, protocol::TimeSetCommand};

// Register addresses
pub mod reg {
    pub const SECONDS: u8 = 0x00;
    pub const MINUTES: u8 = 0x01;
    pub const HOURS: u8 = 0x02;
    pub const DAY: u8 = 0x03;
    pub const DATE: u8 = 0x04;
    pub const MONTH: u8 = 0x05;
    pub const YEAR: u8 = 0x06;
    pub const ALARM1: u8 = 0x07;
    pub const CONTROL: u8 = 0x0E;
    pub const STATUS: u8 = 0x0F;
}

/// Values the clock accepts in a time-keeping register (24-hour mode, two-digit year).
pub const fn field_range(reg: u8) -> RangeInclusive<u8> {
    match reg {
        reg::SECONDS | reg::MINUTES => 0..=59,
        reg::HOURS => 0..=23,
        reg::DAY => 1..=7,
        reg::DATE => 1..=31,
        reg::MONTH => 1..=12,
        _ => 0..=99,
    }
}

fn check_field<E>(reg: u8, value: u8) -> Result<u8, Error<E>> {
    if field_range(reg).contains(&value) {
        Ok(to_bcd(value))
    } else {
        Err(Error::OutOfRange)
    }
}

/// Alarm-1 mask bit: ignore this field when matching.
const ALARM_MASK: u8 = 0x80;
/// Control: interrupt output enabled, alarm-1 interrupt enabled.
const CONTROL_ALARM1_INT: u8 = 0x05;
/// Status: alarm-1 flag.
const STATUS_A1F: u8 = 0x01;

#[inline]
pub const fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

#[inline]
pub const fn from_bcd(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Day of the week as stored in the DAY register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Weekday {
    Sunday = 1,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub fn from_number(n: u8) -> Option<Self> {
        Some(match n {
            1 => Weekday::Sunday,
            2 => Weekday::Monday,
            3 => Weekday::Tuesday,
            4 => Weekday::Wednesday,
            5 => Weekday::Thursday,
            6 => Weekday::Friday,
            7 => Weekday::Saturday,
            _ => return None,
        })
    }
}

/// Decoded clock contents.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DateTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    /// Day of the week, 1 (Sunday) to 7.
    pub day: u8,
    pub date: u8,
    pub month: u8,
    /// Two-digit year, 20xx.
    pub year: u8,
}

impl DateTime {
    /// Decode the seven time-keeping registers.
    pub fn from_registers(regs: &[u8; 7]) -> Self {
        Self {
            seconds: from_bcd(regs[0] & 0x7F),
            minutes: from_bcd(regs[1] & 0x7F),
            hours: from_bcd(regs[2] & 0x3F),
            day: from_bcd(regs[3] & 0x07),
            date: from_bcd(regs[4] & 0x3F),
            month: from_bcd(regs[5] & 0x1F),
            year: from_bcd(regs[6]),
        }
    }

    pub fn weekday(&self) -> Option<Weekday> {
        Weekday::from_number(self.day)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/20{:02} {:02}:{:02}:{:02}",
            self.date, self.month, self.year, self.hours, self.minutes, self.seconds
        )?;
        if let Some(day) = self.weekday() {
            write!(f, " {:?}", day)?;
        }
        Ok(())
    }
}

/// DS1339A on an I2C bus.
pub struct Ds1339<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds1339<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn free(self) -> I2C {
        self.i2c
    }

    /// Write a raw register value.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(config::RTC_ADDR, &[reg, value]).map_err(Error::Bus)
    }

    /// Read a raw register value.
    pub fn read_register(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(config::RTC_ADDR, &[reg], &mut buf)
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }

    /// Range-check `value` for `reg` and write it in BCD. Nothing is sent when out of range.
    fn write_bcd(&mut self, reg: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        let bcd = check_field(reg, value)?;
        self.write_register(reg, bcd)
    }

    fn read_bcd(&mut self, reg: u8) -> Result<u8, Error<I2C::Error>> {
        Ok(from_bcd(self.read_register(reg)?))
    }

    pub fn set_seconds(&mut self, v: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bcd(reg::SECONDS, v)
    }

    pub fn set_minutes(&mut self, v: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bcd(reg::MINUTES, v)
    }

    pub fn set_hours(&mut self, v: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bcd(reg::HOURS, v)
    }

    pub fn set_day(&mut self, v: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bcd(reg::DAY, v)
    }

    pub fn set_date(&mut self, v: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bcd(reg::DATE, v)
    }

    pub fn set_month(&mut self, v: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bcd(reg::MONTH, v)
    }

    pub fn set_year(&mut self, v: u8) -> Result<(), Error<I2C::Error>> {
        self.write_bcd(reg::YEAR, v)
    }

    pub fn seconds(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_bcd(reg::SECONDS)
    }

    pub fn minutes(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_bcd(reg::MINUTES)
    }

    pub fn hours(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_bcd(reg::HOURS)
    }

    pub fn day(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_bcd(reg::DAY)
    }

    pub fn date(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_bcd(reg::DATE)
    }

    pub fn month(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_bcd(reg::MONTH)
    }

    pub fn year(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_bcd(reg::YEAR)
    }

    /// Set hours, minutes and seconds in one burst.
    pub fn set_time(&mut self, hours: u8, minutes: u8, seconds: u8) -> Result<(), Error<I2C::Error>> {
        let frame = [
            reg::SECONDS,
            check_field(reg::SECONDS, seconds)?,
            check_field(reg::MINUTES, minutes)?,
            check_field(reg::HOURS, hours)?,
        ];
        self.i2c.write(config::RTC_ADDR, &frame).map_err(Error::Bus)
    }

    /// Set date, month, year and day of the week in one burst.
    pub fn set_calendar(&mut self, date: u8, month: u8, year: u8, day: u8) -> Result<(), Error<I2C::Error>> {
        let frame = [
            reg::DAY,
            check_field(reg::DAY, day)?,
            check_field(reg::DATE, date)?,
            check_field(reg::MONTH, month)?,
            check_field(reg::YEAR, year)?,
        ];
        self.i2c.write(config::RTC_ADDR, &frame).map_err(Error::Bus)
    }

    /// Burst-read all time-keeping registers.
    pub fn read_datetime(&mut self) -> Result<DateTime, Error<I2C::Error>> {
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(config::RTC_ADDR, &[reg::SECONDS], &mut regs)
            .map_err(Error::Bus)?;
        Ok(DateTime::from_registers(&regs))
    }

    pub fn read_status(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_register(reg::STATUS)
    }

    /// Write `status` back with the alarm flag cleared.
    pub fn clear_alarm_flag(&mut self, status: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register(reg::STATUS, status & !STATUS_A1F)
    }

    /// Mask every alarm-1 field so it matches once per second, and enable its interrupt.
    pub fn configure_second_alarm(&mut self) -> Result<(), Error<I2C::Error>> {
        let frame = [reg::ALARM1, ALARM_MASK, ALARM_MASK, ALARM_MASK, ALARM_MASK];
        self.i2c.write(config::RTC_ADDR, &frame).map_err(Error::Bus)?;
        self.write_register(reg::CONTROL, CONTROL_ALARM1_INT)
    }

    /// Apply a time-set command received over the serial link.
    pub fn apply(&mut self, cmd: TimeSetCommand) -> Result<(), Error<I2C::Error>> {
        match cmd {
            TimeSetCommand::Time {
                hours,
                minutes,
                seconds,
            } => self.set_time(hours, minutes, seconds),
            TimeSetCommand::Date {
                date,
                month,
                year,
                day,
            } => self.set_calendar(date, month, year, day),
        }
    }
}

/// Alarm bookkeeping for the once-per-second clock read.
pub struct RtcMonitor {
    alarm_pending: bool,
    power_on: bool,
    reads: u8,
    report: bool,
}

impl RtcMonitor {
    /// Fresh monitor: the first poll checks the status register without waiting for an alarm
    /// and the first reading is reported.
    pub const fn new() -> Self {
        Self {
            alarm_pending: false,
            power_on: true,
            reads: 0,
            report: true,
        }
    }

    /// Falling edge on the RTC interrupt pin.
    pub fn on_alarm_pin(&mut self) {
        self.alarm_pending = true;
    }

    /// If an alarm is pending, acknowledge it and read the clock.
    ///
    /// Every [`config::RTC_REPORT_EVERY`] reads raise the report flag.
    pub fn poll<I2C: I2c>(&mut self, rtc: &mut Ds1339<I2C>) -> Result<Option<DateTime>, Error<I2C::Error>> {
        if !(self.alarm_pending || self.power_on) {
            return Ok(None);
        }

        let status = rtc.read_status()?;
        if status & STATUS_A1F == 0 {
            return Ok(None);
        }
        self.alarm_pending = false;
        self.power_on = false;
        rtc.clear_alarm_flag(status)?;

        let now = rtc.read_datetime()?;
        self.reads += 1;
        if self.reads >= config::RTC_REPORT_EVERY {
            self.reads = 0;
            self.report = true;
        }
        Ok(Some(now))
    }

    /// Consume the "send time to server" flag.
    pub fn take_report(&mut self) -> bool {
        core::mem::take(&mut self.report)
    }
}

impl Default for RtcMonitor {
    fn default() -> Self {
        Self::new()
    }
}
