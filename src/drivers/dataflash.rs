// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! AT45DB-class SPI DataFlash.
//!
//! The device is addressed as `(page, byte_in_page)` packed into a 24-bit field. Pages are
//! either 528 bytes ("standard", 10-bit byte field) or 512 bytes ("binary", 9-bit byte field);
//! the mode is picked at build time with the `standard-page` feature and checked against the
//! device in [`DataFlash::init`].
//!
//! Program and erase commands leave the device busy; [`DataFlash::issue`] polls the status
//! register after them until the ready bit is set.

use embedded_hal::{digital::OutputPin, spi::SpiBus as HalSpiBus};

use crate::{
    config,
    error::Error,
    hw::{ChipSelect, SpiBus},
    memory::{
        command::{self, CommandKind, DeviceCommand, Payload},
        paging::MemoryRegion,
        status::{self, PollBudget},
    },
};

// Opcodes
pub mod opcode {
    pub const STATUS_READ: u8 = 0xD7;
    pub const PAGE_READ: u8 = 0xD2;
    pub const PAGE_ERASE: u8 = 0x81;
    /// Main memory page program through buffer 1 with built-in erase.
    pub const PROGRAM_ERASE: u8 = 0x82;
    /// Main memory page program through buffer 2 without built-in erase.
    pub const PROGRAM_NO_ERASE_BUF2: u8 = 0x85;
    pub const READ_MODIFY_WRITE: u8 = 0x58;
}

/// Dummy bytes clocked after the address of a main memory page read.
const PAGE_READ_DUMMY: u8 = 4;

pub const CHIP_ERASE: [u8; 4] = [0xC7, 0x94, 0x80, 0x9A];
pub const SOFTWARE_RESET: [u8; 4] = [0xF0, 0x00, 0x00, 0x00];
const PAGE_SIZE_CONFIG: [u8; 3] = [0x3D, 0x2A, 0x80];

/// Page-size mode of the device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddressingMode {
    /// 528-byte pages.
    Standard,
    /// 512-byte pages.
    Binary,
}

impl AddressingMode {
    /// Mode selected by the build.
    pub const fn compiled() -> Self {
        if cfg!(feature = "standard-page") {
            AddressingMode::Standard
        } else {
            AddressingMode::Binary
        }
    }

    #[inline]
    pub const fn page_size(self) -> u32 {
        match self {
            AddressingMode::Standard => 528,
            AddressingMode::Binary => 512,
        }
    }

    /// Width of the byte-in-page field.
    #[inline]
    pub const fn byte_bits(self) -> u32 {
        match self {
            AddressingMode::Standard => 10,
            AddressingMode::Binary => 9,
        }
    }

    #[inline]
    const fn byte_mask(self) -> u32 {
        (1 << self.byte_bits()) - 1
    }

    /// Last byte of the page-size configuration command.
    #[inline]
    const fn config_byte(self) -> u8 {
        match self {
            AddressingMode::Standard => 0xA7,
            AddressingMode::Binary => 0xA6,
        }
    }
}

/// Pack `(page, byte_in_page)` into the 24-bit address field, MSB first.
pub const fn encode_address(page: u32, byte_in_page: u32, mode: AddressingMode) -> [u8; 3] {
    let field = (page << mode.byte_bits()) | (byte_in_page & mode.byte_mask());
    [(field >> 16) as u8, (field >> 8) as u8, field as u8]
}

/// Inverse of [`encode_address`].
pub const fn decode_address(field: [u8; 3], mode: AddressingMode) -> (u32, u32) {
    let raw = (field[0] as u32) << 16 | (field[1] as u32) << 8 | field[2] as u32;
    (raw >> mode.byte_bits(), raw & mode.byte_mask())
}

/// Two-byte status register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Status {
    raw: [u8; 2],
}

impl Status {
    pub const fn from_raw(raw: [u8; 2]) -> Self {
        Self { raw }
    }

    #[inline]
    pub fn raw(&self) -> [u8; 2] {
        self.raw
    }

    /// Device idle, ready for a new command.
    #[inline]
    pub fn is_ready(&self) -> bool {
        (self.raw[1] & 0x80) != 0
    }

    /// Device configured for 512-byte pages.
    #[inline]
    pub fn binary_page_size(&self) -> bool {
        (self.raw[0] & 0x01) != 0
    }

    pub fn mode(&self) -> AddressingMode {
        if self.binary_page_size() {
            AddressingMode::Binary
        } else {
            AddressingMode::Standard
        }
    }
}

/// Status-poll budgets for the busy phase of each command class.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReadyBudgets {
    /// Program, read-modify-write and configuration cycles.
    pub program: PollBudget,
    /// Page erase.
    pub erase: PollBudget,
    /// Chip erase. Orders of magnitude longer than a page erase.
    pub chip_erase: PollBudget,
}

impl Default for ReadyBudgets {
    fn default() -> Self {
        Self {
            program: config::FLASH_PROGRAM_POLLS,
            erase: config::FLASH_ERASE_POLLS,
            chip_erase: config::FLASH_CHIP_ERASE_POLLS,
        }
    }
}

/// DataFlash bound to a chip-select pin.
///
/// The SPI bus is passed in as &mut to each method so that the flash and the SRAM can share the
/// same bus.
pub struct DataFlash<CS: OutputPin> {
    cs: ChipSelect<CS>,
    mode: AddressingMode,
    region: MemoryRegion,
    budgets: ReadyBudgets,
}

impl<CS: OutputPin> DataFlash<CS> {
    /// Construct a driver using the build's addressing mode.
    pub fn new(cs: ChipSelect<CS>) -> Self {
        Self::with_mode(cs, AddressingMode::compiled())
    }

    pub fn with_mode(cs: ChipSelect<CS>, mode: AddressingMode) -> Self {
        Self {
            cs,
            mode,
            region: MemoryRegion::with_pages(config::FLASH_PAGE_COUNT, mode.page_size()),
            budgets: ReadyBudgets::default(),
        }
    }

    /// Replace the status-poll budgets.
    pub fn with_budgets(mut self, budgets: ReadyBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    #[inline]
    pub fn budgets(&self) -> ReadyBudgets {
        self.budgets
    }

    /// Release the chip-select pin.
    pub fn free(self) -> ChipSelect<CS> {
        self.cs
    }

    #[inline]
    pub fn mode(&self) -> AddressingMode {
        self.mode
    }

    #[inline]
    pub fn region(&self) -> &MemoryRegion {
        &self.region
    }

    /// Check the device's page-size mode and reconfigure it if it differs from ours.
    ///
    /// Returns [`Error::ConfigMismatch`] if the device still reports the other mode afterwards.
    pub fn init<SPI>(&mut self, bus: &mut SpiBus<SPI>) -> Result<Status, Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let status = self.read_status(bus)?;
        if status.mode() == self.mode {
            log::debug!("dataflash: {:?} pages, status {:02x?}", self.mode, status.raw());
            return Ok(status);
        }

        log::warn!(
            "dataflash: device in {:?} mode, reconfiguring to {:?}",
            status.mode(),
            self.mode
        );
        self.configure_page_size(bus, self.mode)?;
        self.software_reset(bus)?;
        let status = self.wait_ready(bus, self.budgets.program)?;

        if status.mode() != self.mode {
            log::warn!("dataflash: page size still {:?}", status.mode());
            return Err(Error::ConfigMismatch);
        }
        Ok(status)
    }

    pub fn read_status<SPI>(&mut self, bus: &mut SpiBus<SPI>) -> Result<Status, Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let mut raw = [0u8; 2];
        let cmd = DeviceCommand::opcode(opcode::STATUS_READ, CommandKind::Read);
        command::transmit(bus, &mut self.cs, &cmd, Payload::Read(&mut raw))?;
        Ok(Status::from_raw(raw))
    }

    pub fn is_ready<SPI>(&mut self, bus: &mut SpiBus<SPI>) -> Result<bool, Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        Ok(self.read_status(bus)?.is_ready())
    }

    /// Poll the status register until the device is ready.
    pub fn wait_ready<SPI>(
        &mut self,
        bus: &mut SpiBus<SPI>,
        budget: PollBudget,
    ) -> Result<Status, Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        status::wait_ready(|| self.read_status(bus), Status::is_ready, budget).map_err(Error::flatten)
    }

    /// Send `cmd` with its data phase; wait for ready after program and erase commands.
    pub fn issue<SPI>(
        &mut self,
        bus: &mut SpiBus<SPI>,
        cmd: &DeviceCommand,
        payload: Payload<'_>,
    ) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        command::transmit(bus, &mut self.cs, cmd, payload)?;
        match cmd.kind() {
            CommandKind::Program => self.wait_ready(bus, self.budgets.program).map(|_| ()),
            CommandKind::Erase => self.wait_ready(bus, self.budgets.erase).map(|_| ()),
            CommandKind::Read | CommandKind::Control => Ok(()),
        }
    }

    /// Program the page-size configuration register.
    pub fn configure_page_size<SPI>(
        &mut self,
        bus: &mut SpiBus<SPI>,
        mode: AddressingMode,
    ) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let [a, b, c] = PAGE_SIZE_CONFIG;
        let cmd = DeviceCommand::sequence(&[a, b, c, mode.config_byte()], CommandKind::Program);
        self.issue(bus, &cmd, Payload::None)
    }

    /// Software reset. Does not wait for ready.
    pub fn software_reset<SPI>(&mut self, bus: &mut SpiBus<SPI>) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        let cmd = DeviceCommand::sequence(&SOFTWARE_RESET, CommandKind::Control);
        self.issue(bus, &cmd, Payload::None)
    }

    /// Erase the whole array, waiting with the chip-erase budget.
    pub fn chip_erase<SPI>(&mut self, bus: &mut SpiBus<SPI>) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        log::debug!("dataflash: chip erase");
        let cmd = DeviceCommand::sequence(&CHIP_ERASE, CommandKind::Erase);
        command::transmit(bus, &mut self.cs, &cmd, Payload::None)?;
        self.wait_ready(bus, self.budgets.chip_erase).map(|_| ())
    }

    pub fn erase_page<SPI>(&mut self, bus: &mut SpiBus<SPI>, page: u32) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        self.region.check_page(page, 0, 1)?;
        let cmd = DeviceCommand::addressed(
            opcode::PAGE_ERASE,
            encode_address(page, 0, self.mode),
            CommandKind::Erase,
        );
        self.issue(bus, &cmd, Payload::None)
    }

    /// Program `data` into one page starting at `byte_in_page`, erasing the page first.
    pub fn page_write<SPI>(
        &mut self,
        bus: &mut SpiBus<SPI>,
        page: u32,
        byte_in_page: u32,
        data: &[u8],
    ) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        self.region.check_page(page, byte_in_page, data.len())?;
        let cmd = DeviceCommand::addressed(
            opcode::PROGRAM_ERASE,
            encode_address(page, byte_in_page, self.mode),
            CommandKind::Program,
        );
        self.issue(bus, &cmd, Payload::Write(data))
    }

    /// Read from one page starting at `byte_in_page`.
    pub fn page_read<SPI>(
        &mut self,
        bus: &mut SpiBus<SPI>,
        page: u32,
        byte_in_page: u32,
        buf: &mut [u8],
    ) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        self.region.check_page(page, byte_in_page, buf.len())?;
        let cmd = DeviceCommand::addressed_with_dummy(
            opcode::PAGE_READ,
            encode_address(page, byte_in_page, self.mode),
            PAGE_READ_DUMMY,
            CommandKind::Read,
        );
        self.issue(bus, &cmd, Payload::Read(buf))
    }

    /// Write `data` at a flat offset, preserving the rest of every page touched.
    pub fn write<SPI>(&mut self, bus: &mut SpiBus<SPI>, offset: u32, data: &[u8]) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        for chunk in self.region.plan_transfer(offset, data.len())? {
            let cmd = DeviceCommand::addressed(
                opcode::READ_MODIFY_WRITE,
                encode_address(chunk.page, chunk.byte_in_page, self.mode),
                CommandKind::Program,
            );
            self.issue(bus, &cmd, Payload::Write(&data[chunk.buffer_range()]))?;
        }
        Ok(())
    }

    /// Read `buf.len()` bytes from a flat offset.
    pub fn read<SPI>(&mut self, bus: &mut SpiBus<SPI>, offset: u32, buf: &mut [u8]) -> Result<(), Error<SPI::Error>>
    where
        SPI: HalSpiBus<u8>,
    {
        for chunk in self.region.plan_transfer(offset, buf.len())? {
            self.page_read(bus, chunk.page, chunk.byte_in_page, &mut buf[chunk.buffer_range()])?;
        }
        Ok(())
    }
}
