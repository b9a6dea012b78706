// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Paged external-memory access layer.
//!
//! - `paging`: flat offsets to `(page, byte)` pairs and page-bounded chunks.
//! - `command`: SPI command byte sequences and the chip-select bounded exchange.
//! - `status`: bounded ready polling.

pub mod command;
pub mod paging;
pub mod status;

pub use command::{CommandKind, DeviceCommand, Payload};
pub use paging::{Chunk, MemoryRegion, PageCursor};
pub use status::{wait_ready, PollBudget};
