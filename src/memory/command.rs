// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command byte sequences for SPI memory devices.
//!
//! A [`DeviceCommand`] is at most 8 bytes: an opcode, up to 3 address bytes and up to 4 dummy
//! bytes. It lives on the stack for the duration of one transaction.

use embedded_hal::{digital::OutputPin, spi::SpiBus as HalSpiBus};

use crate::{
    error::Error,
    hw::spi::{ChipSelect, SpiBus},
};

/// Maximum encoded command length.
pub const MAX_COMMAND_LEN: usize = 8;

/// Byte clocked out for dummy cycles.
pub const DUMMY: u8 = 0xFF;

/// What a command does to the device, which decides whether a ready wait follows it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandKind {
    Read,
    Program,
    Erase,
    Control,
}

impl CommandKind {
    /// Program and erase commands leave the device busy.
    #[inline]
    pub fn needs_ready_wait(self) -> bool {
        matches!(self, CommandKind::Program | CommandKind::Erase)
    }
}

/// An encoded device command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceCommand {
    bytes: [u8; MAX_COMMAND_LEN],
    len: u8,
    kind: CommandKind,
}

impl DeviceCommand {
    /// A single opcode byte.
    pub const fn opcode(op: u8, kind: CommandKind) -> Self {
        let mut bytes = [0; MAX_COMMAND_LEN];
        bytes[0] = op;
        Self { bytes, len: 1, kind }
    }

    /// Opcode followed by a 24-bit address, MSB first.
    pub const fn addressed(op: u8, address: [u8; 3], kind: CommandKind) -> Self {
        Self::addressed_with_dummy(op, address, 0, kind)
    }

    /// Opcode, 24-bit address and `dummy` filler bytes (at most 4).
    pub const fn addressed_with_dummy(op: u8, address: [u8; 3], dummy: u8, kind: CommandKind) -> Self {
        assert!(dummy <= 4, "at most 4 dummy bytes");
        let mut bytes = [DUMMY; MAX_COMMAND_LEN];
        bytes[0] = op;
        bytes[1] = address[0];
        bytes[2] = address[1];
        bytes[3] = address[2];
        Self {
            bytes,
            len: 4 + dummy,
            kind,
        }
    }

    /// A fixed multi-byte sequence such as a chip erase or configuration command.
    pub const fn sequence(seq: &[u8], kind: CommandKind) -> Self {
        assert!(!seq.is_empty() && seq.len() <= MAX_COMMAND_LEN, "bad command length");
        let mut bytes = [0; MAX_COMMAND_LEN];
        let mut i = 0;
        while i < seq.len() {
            bytes[i] = seq[i];
            i += 1;
        }
        Self {
            bytes,
            len: seq.len() as u8,
            kind,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    #[inline]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    #[inline]
    pub fn op(&self) -> u8 {
        self.bytes[0]
    }
}

/// Data phase following the command bytes.
pub enum Payload<'p> {
    None,
    Write(&'p [u8]),
    Read(&'p mut [u8]),
}

/// Select the device, send `cmd`, run the data phase and deselect.
pub fn transmit<SPI, CS>(
    bus: &mut SpiBus<SPI>,
    cs: &mut ChipSelect<CS>,
    cmd: &DeviceCommand,
    payload: Payload<'_>,
) -> Result<(), Error<SPI::Error>>
where
    SPI: HalSpiBus<u8>,
    CS: OutputPin,
{
    let mut txn = bus.begin(cs)?;
    txn.write(cmd.as_bytes()).map_err(Error::Bus)?;
    match payload {
        Payload::None => {}
        Payload::Write(data) => txn.write(data).map_err(Error::Bus)?,
        Payload::Read(buf) => txn.read(buf).map_err(Error::Bus)?,
    }
    Ok(())
}
