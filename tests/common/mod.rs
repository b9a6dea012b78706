// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-side stand-ins for the board's buses, pins and devices.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    convert::Infallible,
    rc::Rc,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin},
    i2c::{self, NoAcknowledgeSource, Operation},
    spi,
};

use atsam4_drivers::hw::transport::ByteTransport;

// ---------------------------------------------------------------------------------------------
// SPI devices
// ---------------------------------------------------------------------------------------------

/// A device on the simulated SPI bus.
pub trait SpiTarget {
    fn select(&mut self);
    fn deselect(&mut self);
    fn clock(&mut self, mosi: u8) -> u8;
}

pub struct SimSpi<D>(pub Rc<RefCell<D>>);

impl<D> spi::ErrorType for SimSpi<D> {
    type Error = Infallible;
}

impl<D: SpiTarget> spi::SpiBus<u8> for SimSpi<D> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        let mut dev = self.0.borrow_mut();
        for w in words {
            *w = dev.clock(0xFF);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        let mut dev = self.0.borrow_mut();
        for &w in words {
            dev.clock(w);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        let mut dev = self.0.borrow_mut();
        for i in 0..read.len().max(write.len()) {
            let b = dev.clock(write.get(i).copied().unwrap_or(0xFF));
            if let Some(r) = read.get_mut(i) {
                *r = b;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        let mut dev = self.0.borrow_mut();
        for w in words {
            *w = dev.clock(*w);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Active-low chip select wired to a simulated device.
pub struct SimCs<D>(pub Rc<RefCell<D>>);

impl<D> digital::ErrorType for SimCs<D> {
    type Error = Infallible;
}

impl<D: SpiTarget> OutputPin for SimCs<D> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().select();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().deselect();
        Ok(())
    }
}

pub fn spi_pair<D: SpiTarget>(dev: &Rc<RefCell<D>>) -> (SimSpi<D>, SimCs<D>) {
    (SimSpi(dev.clone()), SimCs(dev.clone()))
}

/// AT45DB-style DataFlash: 8192 pages, status register, buffer program and page read.
pub struct At45 {
    pub memory: Vec<u8>,
    pub binary: bool,
    /// Ignore page-size configuration commands.
    pub sticky_mode: bool,
    /// Status reads reporting busy after each program or erase.
    pub busy_polls: u32,
    pub never_ready: bool,
    busy_left: u32,
    selected: bool,
    rx: Vec<u8>,
    /// Every completed command, all bytes clocked in.
    pub commands: Vec<Vec<u8>>,
    pub status_reads: u32,
}

impl At45 {
    pub const PAGES: usize = 8192;

    pub fn new(binary: bool) -> Self {
        Self {
            memory: vec![0xFF; Self::PAGES * 528],
            binary,
            sticky_mode: false,
            busy_polls: 0,
            never_ready: false,
            busy_left: 0,
            selected: false,
            rx: Vec::new(),
            commands: Vec::new(),
            status_reads: 0,
        }
    }

    pub fn shared(binary: bool) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(binary)))
    }

    pub fn page_size(&self) -> usize {
        if self.binary {
            512
        } else {
            528
        }
    }

    fn byte_bits(&self) -> u32 {
        if self.binary {
            9
        } else {
            10
        }
    }

    /// Decode `rx[1..4]` into a flat memory index.
    fn address(&self) -> usize {
        let raw = u32::from(self.rx[1]) << 16 | u32::from(self.rx[2]) << 8 | u32::from(self.rx[3]);
        let page = (raw >> self.byte_bits()) as usize;
        let byte = (raw & ((1 << self.byte_bits()) - 1)) as usize;
        page * self.page_size() + byte
    }

    pub fn page(&self, page: usize) -> &[u8] {
        let ps = self.page_size();
        &self.memory[page * ps..(page + 1) * ps]
    }

    pub fn opcodes(&self) -> Vec<u8> {
        self.commands.iter().map(|c| c[0]).collect()
    }

    fn start_busy(&mut self) {
        self.busy_left = self.busy_polls;
    }

    fn execute(&mut self) {
        let cmd = std::mem::take(&mut self.rx);
        self.rx = cmd.clone();
        match cmd.as_slice() {
            [0x3D, 0x2A, 0x80, mode] => {
                if !self.sticky_mode {
                    self.binary = *mode == 0xA6;
                }
                self.start_busy();
            }
            [0xC7, 0x94, 0x80, 0x9A] => {
                self.memory.fill(0xFF);
                self.start_busy();
            }
            [0x82, _, _, _, data @ ..] => {
                let at = self.address();
                let ps = self.page_size();
                let page_start = at - at % ps;
                self.memory[page_start..page_start + ps].fill(0xFF);
                self.memory[at..at + data.len()].copy_from_slice(data);
                self.start_busy();
            }
            [0x58, _, _, _, data @ ..] => {
                let at = self.address();
                self.memory[at..at + data.len()].copy_from_slice(data);
                self.start_busy();
            }
            [0x81, _, _, _] => {
                let at = self.address();
                let ps = self.page_size();
                let page_start = at - at % ps;
                self.memory[page_start..page_start + ps].fill(0xFF);
                self.start_busy();
            }
            _ => {}
        }
        self.commands.push(cmd);
        self.rx.clear();
    }
}

impl SpiTarget for At45 {
    fn select(&mut self) {
        self.selected = true;
        self.rx.clear();
    }

    fn deselect(&mut self) {
        if self.selected {
            self.selected = false;
            self.execute();
        }
    }

    fn clock(&mut self, mosi: u8) -> u8 {
        assert!(self.selected, "clocked without chip select");
        self.rx.push(mosi);
        let pos = self.rx.len() - 1;
        match self.rx[0] {
            0xD7 if pos == 1 => u8::from(self.binary),
            0xD7 if pos == 2 => {
                self.status_reads += 1;
                if self.never_ready {
                    0x00
                } else if self.busy_left > 0 {
                    self.busy_left -= 1;
                    0x00
                } else {
                    0x80
                }
            }
            0xD2 if pos >= 8 => {
                let at = self.address() + (pos - 8);
                self.memory[at]
            }
            _ => 0xFF,
        }
    }
}

/// 23LCV04M-style SRAM with byte, page and sequential modes.
pub struct Sram23 {
    pub memory: Vec<u8>,
    pub status: u8,
    selected: bool,
    rx: Vec<u8>,
    cursor: usize,
    pub commands: Vec<Vec<u8>>,
}

impl Sram23 {
    pub const CAPACITY: usize = 512_000;

    pub fn shared(status: u8) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            memory: vec![0; Self::CAPACITY],
            status,
            selected: false,
            rx: Vec::new(),
            cursor: 0,
            commands: Vec::new(),
        }))
    }

    /// `(address, data length)` of each write command.
    pub fn writes(&self) -> Vec<(usize, usize)> {
        self.commands
            .iter()
            .filter(|c| c[0] == 0x02)
            .map(|c| (Self::addr_of(c), c.len() - 4))
            .collect()
    }

    fn addr_of(cmd: &[u8]) -> usize {
        (cmd[1] as usize) << 16 | (cmd[2] as usize) << 8 | cmd[3] as usize
    }

    /// Next cursor position according to the operating mode.
    fn advance(&self, at: usize) -> usize {
        match self.status >> 6 {
            0b00 => at,
            0b10 => at - at % 32 + (at + 1) % 32,
            _ => (at + 1) % Self::CAPACITY,
        }
    }
}

impl SpiTarget for Sram23 {
    fn select(&mut self) {
        self.selected = true;
        self.rx.clear();
    }

    fn deselect(&mut self) {
        if self.selected {
            self.selected = false;
            let cmd = std::mem::take(&mut self.rx);
            if let [0x01, status] = cmd.as_slice() {
                self.status = *status;
            }
            self.commands.push(cmd);
        }
    }

    fn clock(&mut self, mosi: u8) -> u8 {
        assert!(self.selected, "clocked without chip select");
        self.rx.push(mosi);
        let pos = self.rx.len() - 1;
        if pos == 3 && matches!(self.rx[0], 0x02 | 0x03) {
            self.cursor = Self::addr_of(&self.rx);
        }
        match self.rx[0] {
            0x05 if pos >= 1 => self.status,
            0x02 if pos >= 4 => {
                let at = self.cursor;
                self.memory[at] = mosi;
                self.cursor = self.advance(at);
                0xFF
            }
            0x03 if pos >= 4 => {
                let at = self.cursor;
                self.cursor = self.advance(at);
                self.memory[at]
            }
            _ => 0xFF,
        }
    }
}

// ---------------------------------------------------------------------------------------------
// I2C, pins and delays sharing one event log
// ---------------------------------------------------------------------------------------------

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Write { addr: u8, bytes: Vec<u8> },
    Read { addr: u8, len: usize },
    Pin { name: &'static str, high: bool },
    DelayNs(u32),
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Nack;

impl i2c::Error for Nack {
    fn kind(&self) -> i2c::ErrorKind {
        i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// Register-file target: the first `addr_len` bytes of a write set the pointer, the rest are
/// stored from it. Reads continue from the pointer.
pub struct I2cTarget {
    pub addr_len: usize,
    pub memory: Vec<u8>,
    pointer: usize,
}

impl I2cTarget {
    pub fn new(addr_len: usize, size: usize) -> Self {
        Self {
            addr_len,
            memory: vec![0; size],
            pointer: 0,
        }
    }
}

pub struct MockI2c {
    pub log: EventLog,
    pub targets: Rc<RefCell<HashMap<u8, I2cTarget>>>,
}

impl MockI2c {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            targets: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn with_target(self, addr: u8, target: I2cTarget) -> Self {
        self.targets.borrow_mut().insert(addr, target);
        self
    }

    pub fn memory(&self, addr: u8) -> Vec<u8> {
        self.targets.borrow()[&addr].memory.clone()
    }

    pub fn poke(&self, addr: u8, at: usize, bytes: &[u8]) {
        let mut targets = self.targets.borrow_mut();
        let t = targets.get_mut(&addr).expect("unknown target");
        t.memory[at..at + bytes.len()].copy_from_slice(bytes);
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = Nack;
}

impl i2c::I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Nack> {
        let mut targets = self.targets.borrow_mut();
        let Some(target) = targets.get_mut(&address) else {
            for op in operations.iter() {
                if let Operation::Write(bytes) = op {
                    self.log.borrow_mut().push(Event::Write {
                        addr: address,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            return Err(Nack);
        };

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.log.borrow_mut().push(Event::Write {
                        addr: address,
                        bytes: bytes.to_vec(),
                    });
                    let (reg, data) = bytes.split_at(target.addr_len.min(bytes.len()));
                    if !reg.is_empty() {
                        target.pointer = reg.iter().fold(0usize, |acc, &b| acc << 8 | b as usize);
                    }
                    for &b in data {
                        let at = target.pointer % target.memory.len();
                        target.memory[at] = b;
                        target.pointer = at + 1;
                    }
                }
                Operation::Read(buf) => {
                    self.log.borrow_mut().push(Event::Read {
                        addr: address,
                        len: buf.len(),
                    });
                    for slot in buf.iter_mut() {
                        let at = target.pointer % target.memory.len();
                        *slot = target.memory[at];
                        target.pointer = at + 1;
                    }
                }
            }
        }
        Ok(())
    }
}

pub struct RecordingPin {
    pub name: &'static str,
    pub log: EventLog,
}

impl RecordingPin {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self { name, log: log.clone() }
    }
}

impl digital::ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Event::Pin {
            name: self.name,
            high: false,
        });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Event::Pin {
            name: self.name,
            high: true,
        });
        Ok(())
    }
}

pub struct RecordingDelay {
    pub log: EventLog,
}

impl RecordingDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Event::DelayNs(ns));
    }
}

// ---------------------------------------------------------------------------------------------
// Byte transport
// ---------------------------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LinkDown;

/// In-memory transport. Everything it owns is `Send` so it can back a `static` logger.
#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<u8>,
    /// Messages accepted by `send`, one entry per call.
    pub messages: Vec<Vec<u8>>,
    /// `send` calls answered with `WouldBlock` before one is accepted.
    pub busy_sends: u32,
    /// `transmit_complete` polls answered false.
    pub draining: Cell<u32>,
    pub never_drains: bool,
    pub fail_send: bool,
    pub rx: VecDeque<u8>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteTransport for MockTransport {
    type Error = LinkDown;

    fn send(&mut self, bytes: &[u8]) -> nb::Result<(), LinkDown> {
        if self.fail_send {
            return Err(nb::Error::Other(LinkDown));
        }
        if self.busy_sends > 0 {
            self.busy_sends -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.sent.extend_from_slice(bytes);
        self.messages.push(bytes.to_vec());
        Ok(())
    }

    fn transmit_complete(&self) -> bool {
        if self.never_drains {
            return false;
        }
        let left = self.draining.get();
        if left > 0 {
            self.draining.set(left - 1);
            return false;
        }
        true
    }

    fn receive(&mut self) -> nb::Result<u8, LinkDown> {
        self.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn is_ready(&self) -> bool {
        self.busy_sends == 0
    }
}
