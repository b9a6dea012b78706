// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod messages;
pub mod parser;
pub mod usb_frame;

pub use messages::TimeSetCommand;
pub use parser::TimeSetParser;
pub use usb_frame::FrameReceiver;
