// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and the
//! `memory/` paging layer, and below the application logic.
//!
//! ## Existing drivers
//!
//! - [`dataflash`] – AT45DB-class SPI DataFlash (8192 pages of 512 or 528 bytes)
//! - [`sram`] – 23LCV04M-class SPI SRAM (512000 bytes, 32-byte pages)
//! - [`eeprom`] – AT24C64 I2C EEPROM with EUI-48 node address
//! - [`rtc`] – DS1339A I2C real-time clock and its once-per-second alarm
//! - [`rs485`] – half-duplex RS485 link with inter-character supervision

pub mod dataflash;
pub mod eeprom;
pub mod rs485;
pub mod rtc;
pub mod sram;

pub use dataflash::DataFlash;
pub use eeprom::Eeprom;
pub use rs485::{InterCharTimer, Rs485};
pub use rtc::{Ds1339, RtcMonitor};
pub use sram::Sram;
