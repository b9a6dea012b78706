// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Compile-time board configuration.
//!
//! All timing values are whole milliseconds relative to the 1 ms timer tick.

use crate::memory::status::PollBudget;

// Clocks and tick
pub const TICK_HZ: u32 = 1_000;
pub const MCK_HZ: u32 = 120_000_000;
pub const SLOW_CLOCK_HZ: u32 = 32_768;

// Serial
pub const DEBUG_BAUD: u32 = 115_200;
pub const RS485_BAUD: u32 = 9_600;
pub const UART_TX_CAPACITY: usize = 100;

// Buses
pub const SPI_CLOCK_HZ: u32 = 15_000_000;
pub const I2C_SPEED_HZ: u32 = 100_000;

// Timeouts (ms)
pub const DEBOUNCE_MS: u32 = 100;
pub const RS485_INTERCHAR_MS: u32 = 20;
pub const GENERAL_PERIOD_MS: u32 = 1_000;
/// Watchdog reset period; the main loop restarts it well inside this.
pub const WATCHDOG_PERIOD_MS: u32 = 3_000;
pub const EEPROM_WRITE_CYCLE_MS: u32 = 2;
pub const DEFAULT_IP_HOLD_MS: u32 = 5_000;
pub const DEFAULT_IP_LED_ON_MS: u32 = 500;
pub const DEFAULT_IP_LED_OFF_MS: u32 = 500;
/// LED cycles shown after the default-IP reset.
pub const DEFAULT_IP_BLINKS: u32 = 5;

// USB configuration frames
pub const USB_FRAME_CAPACITY: usize = 670;
pub const USB_FRAME_TIMEOUT_MS: u32 = 670;

// Momentary outputs driven by stopwatches
pub const MOMENTARY_OUTPUTS: usize = 4;

/// Status polls allowed for a DataFlash program or read-modify-write cycle.
pub const FLASH_PROGRAM_POLLS: PollBudget = PollBudget::new(100_000);
/// Status polls allowed for a page erase.
pub const FLASH_ERASE_POLLS: PollBudget = PollBudget::new(4_000_000);
/// Status polls allowed for a chip erase, which takes up to 60 s.
pub const FLASH_CHIP_ERASE_POLLS: PollBudget = PollBudget::new(80_000_000);
/// Retries while waiting for a transmit buffer to drain.
pub const TX_DRAIN_POLLS: PollBudget = PollBudget::new(2_000_000);

// DataFlash geometry
pub const FLASH_PAGE_COUNT: u32 = 8_192;

// SPI SRAM geometry
pub const SRAM_CAPACITY: u32 = 512_000;
pub const SRAM_PAGE_SIZE: u32 = 32;

// I2C devices
pub const EEPROM_ADDR: u8 = 0x50;
pub const EEPROM_EUI_ADDR: u8 = 0x58;
pub const EEPROM_EUI_REG: u8 = 0x9A;
pub const EEPROM_PAGE_SIZE: u32 = 32;
pub const EEPROM_CAPACITY: u32 = EEPROM_PAGE_SIZE * 256;
pub const RTC_ADDR: u8 = 0x68;

/// Number of RTC reads between two "send time to server" reports.
pub const RTC_REPORT_EVERY: u8 = 5;
