// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCU-level wrappers: board pins, SPI, USART, LEDs, digital inputs, TC and watchdog timing,
//! and the byte transport contract.

pub mod input;
pub mod led;
pub mod pins;
pub mod spi;
pub mod tc;
pub mod transport;
pub mod usart;
pub mod wdt;

pub use input::{DigitalInputs, Input, Port};
pub use led::{Led, StatusLeds};
pub use spi::{ChipSelect, SpiBus, Transaction};
pub use tc::{TcClock, TickTimerConfig};
pub use transport::ByteTransport;
pub use usart::{RxLatch, TxQueue, Usart};
pub use wdt::WatchdogConfig;
