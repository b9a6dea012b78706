// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 23LCV04M-class SPI SRAM (4 Mbit, 32-byte pages).
//!
//! The device takes a flat 24-bit byte address. Its operating mode, in bits 7:6 of the status
//! register, decides how far one command may run: a single byte, up to the end of the current
//! 32-byte page, or through the whole array. Transfers are split accordingly.

use embedded_hal::{digital::OutputPin, spi::SpiBus as HalSpiBus};

use crate::{
    config,
    error::Error,
    hw::{ChipSelect, SpiBus},
    memory::{
        command::{self, CommandKind, DeviceCommand, Payload},
        paging::MemoryRegion,
    },
};

// Opcodes
pub mod opcode {
    pub const READ_STATUS: u8 = 0x05;
    pub const WRITE_STATUS: u8 = 0x01;
    pub const WRITE: u8 = 0x02;
    pub const READ: u8 = 0x03;
}

/// Operating mode (status register bits 7:6).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperatingMode {
    Byte,
    Page,
    Sequential,
}

impl OperatingMode {
    /// Decode the mode bits. The reserved pattern `11` gives `None`.
    pub fn from_status(status: u8) -> Option<Self> {
        match status >> 6 {
            0b00 => Some(OperatingMode::Byte),
            0b10 => Some(OperatingMode::Page),
            0b01 => Some(OperatingMode::Sequential),
            _ => None,
        }
    }

    pub const fn status_bits(self) -> u8 {
        match self {
            OperatingMode::Byte => 0b00 << 6,
            OperatingMode::Page => 0b10 << 6,
            OperatingMode::Sequential => 0b01 << 6,
        }
    }

    /// Largest run one command may cover, `None` if unbounded.
    const fn burst(self) -> Option<u32> {
        match self {
            OperatingMode::Byte => Some(1),
            OperatingMode::Page => Some(config::SRAM_PAGE_SIZE),
            OperatingMode::Sequential => None,
        }
    }
}

#[inline]
const fn address_bytes(addr: u32) -> [u8; 3] {
    [(addr >> 16) as u8, (addr >> 8) as u8, addr as u8]
}

/// SPI SRAM bound to a chip-select pin.
pub struct Sram<CS: OutputPin> {
    cs: ChipSelect<CS>,
    mode: OperatingMode,
    region: MemoryRegion,
}

impl<CS: OutputPin> Sram<CS> {
    /// Construct a driver assuming the power-on sequential mode. Call [`init`](Self::init) to
    /// read the actual mode.
    pub fn new(cs: ChipSelect<CS>) -> Self {
        Self {
            cs,
            mode: OperatingMode::Sequential,
            region: MemoryRegion::new(config::SRAM_CAPACITY, config::SRAM_PAGE_SIZE),
        }
    }

    pub fn free(self) -> ChipSelect<CS> {
        self.cs
    }

    #[inline]
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    #[inline]
    pub fn region(&self) -> &MemoryRegion {
        &self.region
    }

    /// Read the operating mode from the device.
    pub fn init<SPI>(&mut self, bus: &mut SpiBus<SPI>) -> Result<OperatingMode, Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let status = self.read_status(bus)?;
        self.mode = OperatingMode::from_status(status).ok_or(Error::ConfigMismatch)?;
        log::debug!("sram: {:?} mode", self.mode);
        Ok(self.mode)
    }

    pub fn read_status<SPI>(&mut self, bus: &mut SpiBus<SPI>) -> Result<u8, Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let mut status = [0u8; 1];
        let cmd = DeviceCommand::opcode(opcode::READ_STATUS, CommandKind::Read);
        command::transmit(bus, &mut self.cs, &cmd, Payload::Read(&mut status))?;
        Ok(status[0])
    }

    pub fn write_status<SPI>(&mut self, bus: &mut SpiBus<SPI>, status: u8) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let cmd = DeviceCommand::opcode(opcode::WRITE_STATUS, CommandKind::Control);
        command::transmit(bus, &mut self.cs, &cmd, Payload::Write(&[status]))
    }

    /// Switch the operating mode.
    pub fn set_mode<SPI>(&mut self, bus: &mut SpiBus<SPI>, mode: OperatingMode) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        self.write_status(bus, mode.status_bits())?;
        self.mode = mode;
        Ok(())
    }

    /// Write `data` at a flat byte address.
    pub fn write<SPI>(&mut self, bus: &mut SpiBus<SPI>, addr: u32, data: &[u8]) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        self.region.check_range(addr, data.len())?;
        let Some(burst) = self.mode.burst() else {
            return self.write_run(bus, addr, data);
        };

        let runs = MemoryRegion::new(self.region.capacity(), burst);
        for chunk in runs.plan_transfer(addr, data.len())? {
            let at = runs.offset_of(chunk.page, chunk.byte_in_page);
            self.write_run(bus, at, &data[chunk.buffer_range()])?;
        }
        Ok(())
    }

    /// Read `buf.len()` bytes from a flat byte address.
    pub fn read<SPI>(&mut self, bus: &mut SpiBus<SPI>, addr: u32, buf: &mut [u8]) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        self.region.check_range(addr, buf.len())?;
        let Some(burst) = self.mode.burst() else {
            return self.read_run(bus, addr, buf);
        };

        let runs = MemoryRegion::new(self.region.capacity(), burst);
        for chunk in runs.plan_transfer(addr, buf.len())? {
            let at = runs.offset_of(chunk.page, chunk.byte_in_page);
            self.read_run(bus, at, &mut buf[chunk.buffer_range()])?;
        }
        Ok(())
    }

    fn write_run<SPI>(&mut self, bus: &mut SpiBus<SPI>, addr: u32, data: &[u8]) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let cmd = DeviceCommand::addressed(opcode::WRITE, address_bytes(addr), CommandKind::Program);
        command::transmit(bus, &mut self.cs, &cmd, Payload::Write(data))
    }

    fn read_run<SPI>(&mut self, bus: &mut SpiBus<SPI>, addr: u32, buf: &mut [u8]) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let cmd = DeviceCommand::addressed(opcode::READ, address_bytes(addr), CommandKind::Read);
        command::transmit(bus, &mut self.cs, &cmd, Payload::Read(buf))
    }
}
