// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the ATSAM4E16E access-control board.
//!
//! The digital inputs have their own table in [`super::input`]; everything else the firmware
//! drives or hands to a peripheral is listed here.

use super::input::Port;

/// PIO controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Bank {
    A,
    B,
    D,
}

impl From<Port> for Bank {
    fn from(port: Port) -> Self {
        match port {
            Port::A => Bank::A,
            Port::D => Bank::D,
        }
    }
}

/// One PIO line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pin {
    pub bank: Bank,
    pub index: u8,
}

impl Pin {
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self.index
    }
}

const fn pa(index: u8) -> Pin {
    Pin { bank: Bank::A, index }
}

const fn pb(index: u8) -> Pin {
    Pin { bank: Bank::B, index }
}

const fn pd(index: u8) -> Pin {
    Pin { bank: Bank::D, index }
}

// LEDs, active low
pub const LED_POWER: Pin = pa(18);
pub const LED_RS485_RX: Pin = pa(19);
pub const LED_RS485_TX: Pin = pb(11);

// SPI memories
pub const FLASH_CS: Pin = pa(15);
pub const SRAM_CS: Pin = pa(16);
/// DataFlash and SRAM write-protect, active low. Held high.
pub const SPI_MEM_WP: Pin = pd(27);

/// EEPROM write-protect, high while protected.
pub const EEPROM_WP: Pin = pa(5);

/// RS485 transceiver direction, high to transmit.
pub const RS485_EN: Pin = pa(20);

/// DS1339 SQW/INT output, falling edge once per second.
pub const RTC_INT: Pin = pd(28);

/// Every pin driven as a PIO output.
pub const OUTPUTS: [Pin; 8] = [
    LED_POWER,
    LED_RS485_RX,
    LED_RS485_TX,
    FLASH_CS,
    SRAM_CS,
    SPI_MEM_WP,
    EEPROM_WP,
    RS485_EN,
];

// Peripheral lines
pub const TWI0_PINS: u32 = pa(3).mask() | pa(4).mask();
pub const UART0_PINS: u32 = pa(9).mask() | pa(10).mask();
pub const SPI_PINS: u32 = pa(12).mask() | pa(13).mask() | pa(14).mask();
pub const USART0_PINS: u32 = pb(0).mask() | pb(1).mask();
