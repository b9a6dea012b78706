// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # ATSAM4 Peripheral Drivers
//!
//! This crate contains the peripheral drivers of an ATSAM4E access-control board, written in
//! Rust: external SPI DataFlash and SRAM, I2C EEPROM and RTC, RS485 and USB links, digital
//! inputs, LEDs and the 1 ms timer tick.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`memory`] | Page addressing, SPI command framing, ready polling |
//! | [`hw`] | MCU-level wrappers around SPI, USART, LEDs, inputs, TC clocking |
//! | [`drivers`] | Device-level drivers (e.g., AT45 DataFlash, DS1339A) |
//! | [`timer`] | Millisecond tick dispatch and tick-driven counters |
//! | [`protocol`] | Time-set and USB configuration frames |
//! | [`system`] | The board's tick handlers in dispatch order |
//! | [`logging`] | `log` backend over a serial port |
//!
//! Drivers are generic over the `embedded-hal` 1.0 traits, so everything except the firmware
//! binary builds and tests on the host.
//!
//! ## Getting Started
//!
//! Build docs:
//!
//! ```bash
//! cargo doc --no-deps --open
//! ```
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features board --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod drivers;
pub mod error;
pub mod hw;
pub mod logging;
pub mod memory;
pub mod protocol;
pub mod system;
pub mod timer;

pub use error::Error;
