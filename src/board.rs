// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Peripheral glue for the ATSAM4E16E board.
//!
//! The library only sees `embedded-hal` traits and [`ByteTransport`]; this module provides them
//! on top of the PAC's PIO, SPI, TWI, UART/USART, TC and WDT register blocks. Every block is
//! moved in from `pac::Peripherals::take()`.

use core::{cell::RefCell, convert::Infallible, hint::spin_loop};

use atsam4_hal::pac::{self, Interrupt};
use critical_section::Mutex;
use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin, PinState},
    i2c::{self, I2c, NoAcknowledgeSource, Operation, SevenBitAddress},
    spi::{self, SpiBus},
};

use atsam4_drivers::{
    config,
    hw::{
        pins::{self, Bank, Pin},
        tc::TickTimerConfig,
        transport::ByteTransport,
        usart::{RxLatch, TxOverflow, TxQueue},
        wdt::WatchdogConfig,
    },
};

// ---------------------------------------------------------------------------------------------
// PMC / WDT
// ---------------------------------------------------------------------------------------------

/// Enable the clock of each peripheral in `ids`.
///
/// On this part a peripheral's PMC identifier is its interrupt number.
pub fn enable_peripheral_clocks(pmc: &pac::PMC, ids: &[Interrupt]) {
    let mask = ids.iter().fold(0u32, |m, &id| m | 1 << id as u32);
    pmc.pmc_pcer0.write(|w| unsafe { w.bits(mask) });
}

/// Reset watchdog. The mode register is write-once, so it is configured exactly once here.
pub struct Watchdog {
    wdt: pac::WDT,
}

impl Watchdog {
    /// Start counting; a fault resets the processor.
    pub fn start(wdt: pac::WDT, cfg: WatchdogConfig) -> Self {
        wdt.mr.write(|w| {
            unsafe {
                w.wdv().bits(cfg.counts);
                w.wdd().bits(cfg.counts);
            }
            w.wdrsten().set_bit();
            w.wdrproc().set_bit();
            w.wddis().clear_bit();
            w.wddbghlt().clear_bit();
            w.wdidlehlt().clear_bit();
            w
        });
        Self { wdt }
    }

    /// Restart the counter.
    #[inline]
    pub fn feed(&self) {
        self.wdt.cr.write(|w| {
            w.key().passwd();
            w.wdrstt().set_bit();
            w
        });
    }
}

// ---------------------------------------------------------------------------------------------
// PIO
// ---------------------------------------------------------------------------------------------

/// Register block of `bank` for single-register accesses outside the owning [`Pio`].
fn regs(bank: Bank) -> &'static pac::pioa::RegisterBlock {
    // SAFETY: used only for level and interrupt-status reads and for set/clear writes, each a
    // single access that cannot race configuration done through `Pio`.
    unsafe {
        match bank {
            Bank::A => &*pac::PIOA::ptr(),
            Bank::B => &*pac::PIOB::ptr(),
            Bank::D => &*pac::PIOD::ptr(),
        }
    }
}

/// Peripheral function of a multiplexed pin.
#[derive(Copy, Clone, Debug)]
pub enum Periph {
    A,
    C,
}

/// The PIO controllers in use, claimed from the PAC.
pub struct Pio {
    pioa: pac::PIOA,
    piob: pac::PIOB,
    piod: pac::PIOD,
}

impl Pio {
    pub fn new(pioa: pac::PIOA, piob: pac::PIOB, piod: pac::PIOD) -> Self {
        Self { pioa, piob, piod }
    }

    fn block(&self, bank: Bank) -> &pac::pioa::RegisterBlock {
        match bank {
            Bank::A => &*self.pioa,
            Bank::B => &*self.piob,
            Bank::D => &*self.piod,
        }
    }

    /// Hand the pins in `mask` to a peripheral.
    pub fn select_peripheral(&self, bank: Bank, mask: u32, periph: Periph) {
        let pio = self.block(bank);
        pio.pio_abcdsr[0].modify(|r, w| unsafe { w.bits(r.bits() & !mask) });
        pio.pio_abcdsr[1].modify(|r, w| unsafe {
            match periph {
                Periph::A => w.bits(r.bits() & !mask),
                Periph::C => w.bits(r.bits() | mask),
            }
        });
        pio.pio_pdr.write(|w| unsafe { w.bits(mask) });
    }

    /// Push-pull output starting at `initial`.
    pub fn output(&self, pin: Pin, initial: PinState) -> PioPin {
        let mut out = PioPin { bank: pin.bank, mask: pin.mask() };
        out.set_state(initial).ok();
        let pio = self.block(pin.bank);
        pio.pio_per.write(|w| unsafe { w.bits(out.mask) });
        pio.pio_oer.write(|w| unsafe { w.bits(out.mask) });
        out
    }

    /// Pulled-up, glitch-filtered inputs interrupting on both edges.
    pub fn edge_inputs(&self, bank: Bank, mask: u32) {
        let pio = self.block(bank);
        pio.pio_per.write(|w| unsafe { w.bits(mask) });
        pio.pio_odr.write(|w| unsafe { w.bits(mask) });
        pio.pio_puer.write(|w| unsafe { w.bits(mask) });
        pio.pio_ifer.write(|w| unsafe { w.bits(mask) });
        pio.pio_ier.write(|w| unsafe { w.bits(mask) });
    }

    /// Pulled-up input interrupting on its falling edge only.
    pub fn falling_edge_input(&self, pin: Pin) {
        let pio = self.block(pin.bank);
        let mask = pin.mask();
        pio.pio_per.write(|w| unsafe { w.bits(mask) });
        pio.pio_odr.write(|w| unsafe { w.bits(mask) });
        pio.pio_puer.write(|w| unsafe { w.bits(mask) });
        pio.pio_aimer.write(|w| unsafe { w.bits(mask) });
        pio.pio_esr.write(|w| unsafe { w.bits(mask) });
        pio.pio_fellsr.write(|w| unsafe { w.bits(mask) });
        pio.pio_ier.write(|w| unsafe { w.bits(mask) });
    }
}

#[inline]
pub fn pin_level(bank: Bank, pin: u8) -> bool {
    regs(bank).pio_pdsr.read().bits() & (1u32 << pin) != 0
}

/// Read and clear the pending edge interrupts of `bank`.
#[inline]
pub fn take_pin_interrupts(bank: Bank) -> u32 {
    regs(bank).pio_isr.read().bits()
}

/// Push-pull output driven through the set/clear registers.
pub struct PioPin {
    bank: Bank,
    mask: u32,
}

impl digital::ErrorType for PioPin {
    type Error = Infallible;
}

impl OutputPin for PioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        regs(self.bank).pio_codr.write(|w| unsafe { w.bits(self.mask) });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        regs(self.bank).pio_sodr.write(|w| unsafe { w.bits(self.mask) });
        Ok(())
    }
}

// ---------------------------------------------------------------------------------------------
// SPI
// ---------------------------------------------------------------------------------------------

/// SPI master in mode 0. Chip selects are plain PIO outputs.
pub struct Spi0 {
    spi: pac::SPI,
}

impl Spi0 {
    /// PA12 MISO, PA13 MOSI, PA14 SPCK.
    pub fn new(spi: pac::SPI, pio: &Pio, clock_hz: u32) -> Self {
        pio.select_peripheral(Bank::A, pins::SPI_PINS, Periph::A);

        let scbr = (config::MCK_HZ / clock_hz).clamp(1, 255) as u8;
        spi.spi_cr.write(|w| w.swrst().set_bit());
        spi.spi_cr.write(|w| w.swrst().set_bit());
        spi.spi_mr.write(|w| w.mstr().set_bit().modfdis().set_bit());
        spi.spi_csr[0].write(|w| {
            unsafe { w.scbr().bits(scbr) };
            w.ncpha().set_bit()
        });
        spi.spi_cr.write(|w| w.spien().set_bit());
        Self { spi }
    }

    fn exchange(&mut self, out: u8) -> u8 {
        while self.spi.spi_sr.read().tdre().bit_is_clear() {
            spin_loop();
        }
        self.spi.spi_tdr.write(|w| unsafe { w.td().bits(u16::from(out)) });
        while self.spi.spi_sr.read().rdrf().bit_is_clear() {
            spin_loop();
        }
        self.spi.spi_rdr.read().rd().bits() as u8
    }
}

impl spi::ErrorType for Spi0 {
    type Error = Infallible;
}

impl SpiBus<u8> for Spi0 {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for w in words {
            *w = self.exchange(0xFF);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for &w in words {
            self.exchange(w);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        for i in 0..read.len().max(write.len()) {
            let b = self.exchange(write.get(i).copied().unwrap_or(0xFF));
            if let Some(slot) = read.get_mut(i) {
                *slot = b;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for w in words {
            *w = self.exchange(*w);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while self.spi.spi_sr.read().txempty().bit_is_clear() {
            spin_loop();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------------------------
// TWI
// ---------------------------------------------------------------------------------------------

/// Status polls per TWI byte.
const TWI_POLLS: u32 = 100_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TwiError {
    Nack,
    Timeout,
}

impl i2c::Error for TwiError {
    fn kind(&self) -> i2c::ErrorKind {
        match self {
            TwiError::Nack => i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            TwiError::Timeout => i2c::ErrorKind::Other,
        }
    }
}

/// Status flag a TWI transfer step waits on.
#[derive(Copy, Clone)]
enum TwiFlag {
    TxComplete,
    RxReady,
    TxReady,
}

/// TWI0 master on PA3 (TWD0) and PA4 (TWCK0).
///
/// The controller has no raw repeated start; a write of up to three bytes followed by a read
/// is issued as an internal-address read.
pub struct Twi0 {
    twi: pac::TWI0,
}

impl Twi0 {
    pub fn new(twi: pac::TWI0, pio: &Pio, speed_hz: u32) -> Self {
        pio.select_peripheral(Bank::A, pins::TWI0_PINS, Periph::A);

        twi.twi_cr.write(|w| w.swrst().set_bit());
        twi.twi_rhr.read();
        twi.twi_cr.write(|w| w.msdis().set_bit().svdis().set_bit());
        twi.twi_cr.write(|w| w.msen().set_bit());

        let mut ckdiv = 0u8;
        let mut cldiv = (config::MCK_HZ / (2 * speed_hz)).saturating_sub(4);
        while cldiv > 255 && ckdiv < 7 {
            ckdiv += 1;
            cldiv /= 2;
        }
        let cldiv = cldiv.min(255) as u8;
        twi.twi_cwgr.write(|w| unsafe { w.cldiv().bits(cldiv).chdiv().bits(cldiv).ckdiv().bits(ckdiv) });
        Self { twi }
    }

    fn wait(&self, flag: TwiFlag) -> Result<(), TwiError> {
        for _ in 0..TWI_POLLS {
            let sr = self.twi.twi_sr.read();
            if sr.nack().bit_is_set() {
                return Err(TwiError::Nack);
            }
            let done = match flag {
                TwiFlag::TxComplete => sr.txcomp().bit_is_set(),
                TwiFlag::RxReady => sr.rxrdy().bit_is_set(),
                TwiFlag::TxReady => sr.txrdy().bit_is_set(),
            };
            if done {
                return Ok(());
            }
            spin_loop();
        }
        Err(TwiError::Timeout)
    }

    fn write_to(&mut self, address: u8, bytes: &[u8]) -> Result<(), TwiError> {
        self.twi.twi_mmr.write(|w| unsafe { w.dadr().bits(address) });
        self.twi.twi_iadr.write(|w| unsafe { w.bits(0) });
        for &b in bytes {
            self.twi.twi_thr.write(|w| unsafe { w.txdata().bits(b) });
            self.wait(TwiFlag::TxReady)?;
        }
        self.twi.twi_cr.write(|w| w.stop().set_bit());
        self.wait(TwiFlag::TxComplete)
    }

    fn read_from(&mut self, address: u8, internal: &[u8], buf: &mut [u8]) -> Result<(), TwiError> {
        let iadr = internal.iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b));
        self.twi.twi_mmr.write(|w| {
            unsafe { w.dadr().bits(address).iadrsz().bits(internal.len() as u8) };
            w.mread().set_bit()
        });
        self.twi.twi_iadr.write(|w| unsafe { w.iadr().bits(iadr) });

        let last = buf.len().saturating_sub(1);
        if buf.len() <= 1 {
            self.twi.twi_cr.write(|w| w.start().set_bit().stop().set_bit());
        } else {
            self.twi.twi_cr.write(|w| w.start().set_bit());
        }
        for (i, slot) in buf.iter_mut().enumerate() {
            if i == last && i > 0 {
                self.twi.twi_cr.write(|w| w.stop().set_bit());
            }
            self.wait(TwiFlag::RxReady)?;
            *slot = self.twi.twi_rhr.read().rxdata().bits();
        }
        self.wait(TwiFlag::TxComplete)
    }
}

impl i2c::ErrorType for Twi0 {
    type Error = TwiError;
}

impl I2c<SevenBitAddress> for Twi0 {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if let [Operation::Write(reg), Operation::Read(buf)] = operations {
            if reg.len() <= 3 {
                return self.read_from(address, &reg[..], &mut buf[..]);
            }
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.write_to(address, bytes)?,
                Operation::Read(buf) => self.read_from(address, &[], buf)?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------------------------
// UART0 / USART0
// ---------------------------------------------------------------------------------------------

/// Status flags shared by the UART and USART.
#[derive(Copy, Clone, Default)]
pub struct SerialStatus {
    pub rx_ready: bool,
    pub tx_ready: bool,
    pub tx_empty: bool,
}

#[derive(Copy, Clone)]
pub enum SerialEvent {
    RxReady,
    TxReady,
    TxEmpty,
}

/// Register access common to UART0 and USART0 in asynchronous 8N1 mode.
pub trait SerialRegisters: Send + 'static {
    fn configure(&self, baud: u32);
    /// Status register.
    fn status(&self) -> SerialStatus;
    /// Interrupts currently enabled.
    fn enabled(&self) -> SerialStatus;
    fn read_data(&self) -> u8;
    fn write_data(&self, byte: u8);
    fn listen(&self, event: SerialEvent);
    fn unlisten(&self, event: SerialEvent);
}

macro_rules! serial_registers {
    ($periph:ty, $cr:ident, $mr:ident, $ier:ident, $idr:ident, $imr:ident, $sr:ident, $rhr:ident,
     $thr:ident, $brgr:ident, $mode:expr) => {
        impl SerialRegisters for $periph {
            fn configure(&self, baud: u32) {
                let cd = (config::MCK_HZ / (16 * baud)) as u16;
                self.$cr.write(|w| w.rstrx().set_bit().rsttx().set_bit());
                self.$mr.write($mode);
                self.$brgr.write(|w| unsafe { w.cd().bits(cd) });
                self.$cr.write(|w| w.rxen().set_bit().txen().set_bit());
                self.$ier.write(|w| w.rxrdy().set_bit());
            }

            fn status(&self) -> SerialStatus {
                let r = self.$sr.read();
                SerialStatus {
                    rx_ready: r.rxrdy().bit_is_set(),
                    tx_ready: r.txrdy().bit_is_set(),
                    tx_empty: r.txempty().bit_is_set(),
                }
            }

            fn enabled(&self) -> SerialStatus {
                let r = self.$imr.read();
                SerialStatus {
                    rx_ready: r.rxrdy().bit_is_set(),
                    tx_ready: r.txrdy().bit_is_set(),
                    tx_empty: r.txempty().bit_is_set(),
                }
            }

            #[inline]
            fn read_data(&self) -> u8 {
                self.$rhr.read().bits() as u8
            }

            #[inline]
            fn write_data(&self, byte: u8) {
                self.$thr.write(|w| unsafe { w.bits(u32::from(byte)) });
            }

            fn listen(&self, event: SerialEvent) {
                self.$ier.write(|w| match event {
                    SerialEvent::RxReady => w.rxrdy().set_bit(),
                    SerialEvent::TxReady => w.txrdy().set_bit(),
                    SerialEvent::TxEmpty => w.txempty().set_bit(),
                });
            }

            fn unlisten(&self, event: SerialEvent) {
                self.$idr.write(|w| match event {
                    SerialEvent::RxReady => w.rxrdy().set_bit(),
                    SerialEvent::TxReady => w.txrdy().set_bit(),
                    SerialEvent::TxEmpty => w.txempty().set_bit(),
                });
            }
        }
    };
}

// UART0: no parity.
serial_registers!(
    pac::UART0, uart_cr, uart_mr, uart_ier, uart_idr, uart_imr, uart_sr, uart_rhr, uart_thr, uart_brgr,
    |w| unsafe { w.par().bits(4) }
);

// USART0: 8-bit characters, no parity, one stop bit.
serial_registers!(
    pac::USART0, us_cr, us_mr, us_ier, us_idr, us_imr, us_csr, us_rhr, us_thr, us_brgr,
    |w| unsafe { w.chrl().bits(3).par().bits(4) }
);

pub type TxBuffer = TxQueue<{ config::UART_TX_CAPACITY }>;

/// A serial peripheral and its queues, shared between the main loop and the interrupt.
pub struct SerialChannel<U> {
    regs: Mutex<RefCell<Option<U>>>,
    tx: Mutex<RefCell<TxBuffer>>,
    rx: Mutex<RefCell<RxLatch>>,
}

impl<U> SerialChannel<U> {
    const fn new() -> Self {
        Self {
            regs: Mutex::new(RefCell::new(None)),
            tx: Mutex::new(RefCell::new(TxQueue::new())),
            rx: Mutex::new(RefCell::new(RxLatch::new())),
        }
    }
}

pub static UART0: SerialChannel<pac::UART0> = SerialChannel::new();
pub static USART0: SerialChannel<pac::USART0> = SerialChannel::new();

/// Interrupt-driven serial port. Cheap handle over a static channel.
pub struct SerialPort<U: 'static> {
    channel: &'static SerialChannel<U>,
}

impl<U: 'static> Clone for SerialPort<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U: 'static> Copy for SerialPort<U> {}

impl SerialPort<pac::UART0> {
    /// Debug port on PA9 (URXD0) / PA10 (UTXD0).
    pub fn uart0() -> Self {
        Self { channel: &UART0 }
    }

    pub fn init_uart0(uart: pac::UART0, pio: &Pio, baud: u32) -> Self {
        pio.select_peripheral(Bank::A, pins::UART0_PINS, Periph::A);
        Self::uart0().install(uart, baud)
    }
}

impl SerialPort<pac::USART0> {
    /// RS485 port on PB0 (RXD0) / PB1 (TXD0).
    pub fn usart0() -> Self {
        Self { channel: &USART0 }
    }

    pub fn init_usart0(usart: pac::USART0, pio: &Pio, baud: u32) -> Self {
        pio.select_peripheral(Bank::B, pins::USART0_PINS, Periph::C);
        Self::usart0().install(usart, baud)
    }
}

impl<U: SerialRegisters> SerialPort<U> {
    fn install(self, regs: U, baud: u32) -> Self {
        regs.configure(baud);
        critical_section::with(|cs| *self.channel.regs.borrow_ref_mut(cs) = Some(regs));
        self
    }

    fn with_regs<R>(&self, f: impl FnOnce(&U) -> R) -> Option<R> {
        critical_section::with(|cs| self.channel.regs.borrow_ref(cs).as_ref().map(f))
    }

    /// Interrupt service. Returns the byte received, if any.
    pub fn service(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let guard = self.channel.regs.borrow_ref(cs);
            let regs = guard.as_ref()?;
            let status = regs.status();
            let enabled = regs.enabled();

            let received = status.rx_ready.then(|| regs.read_data());
            if let Some(b) = received {
                self.channel.rx.borrow_ref_mut(cs).on_rx(b);
            }

            if status.tx_ready && enabled.tx_ready {
                match self.channel.tx.borrow_ref_mut(cs).on_tx_ready() {
                    Some(b) => regs.write_data(b),
                    None => {
                        regs.unlisten(SerialEvent::TxReady);
                        regs.listen(SerialEvent::TxEmpty);
                    }
                }
            }

            if status.tx_empty && enabled.tx_empty {
                regs.unlisten(SerialEvent::TxEmpty);
                self.channel.tx.borrow_ref_mut(cs).on_tx_empty();
            }

            received
        })
    }
}

impl<U: SerialRegisters> ByteTransport for SerialPort<U> {
    type Error = TxOverflow;

    fn send(&mut self, bytes: &[u8]) -> nb::Result<(), Self::Error> {
        critical_section::with(|cs| self.channel.tx.borrow_ref_mut(cs).load(bytes))?;
        self.with_regs(|r| r.listen(SerialEvent::TxReady));
        Ok(())
    }

    fn transmit_complete(&self) -> bool {
        self.is_ready() && self.with_regs(|r| r.status().tx_empty).unwrap_or(false)
    }

    fn receive(&mut self) -> nb::Result<u8, Self::Error> {
        critical_section::with(|cs| self.channel.rx.borrow_ref_mut(cs).take()).ok_or(nb::Error::WouldBlock)
    }

    fn is_ready(&self) -> bool {
        critical_section::with(|cs| self.channel.tx.borrow_ref(cs).is_ready())
    }
}

// ---------------------------------------------------------------------------------------------
// TC0 tick
// ---------------------------------------------------------------------------------------------

/// Channel 0 of TC0 restarting on RC compare.
pub struct TickTimer {
    tc: pac::TC0,
}

impl TickTimer {
    /// Start the channel with an RC-compare interrupt.
    pub fn start(tc: pac::TC0, cfg: TickTimerConfig) -> Self {
        tc.tc_cmr0.write(|w| {
            unsafe { w.tcclks().bits(cfg.clock.bits()) };
            w.cpctrg().set_bit()
        });
        tc.tc_rc0.write(|w| unsafe { w.bits(u32::from(cfg.rc)) });
        tc.tc_ier0.write(|w| w.cpcs().set_bit());
        tc.tc_ccr0.write(|w| w.clken().set_bit().swtrg().set_bit());
        Self { tc }
    }

    /// Read and clear the channel status. True on an RC compare.
    #[inline]
    pub fn take_tick(&self) -> bool {
        self.tc.tc_sr0.read().cpcs().bit_is_set()
    }
}

// ---------------------------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------------------------

/// Busy-wait delay counted in core cycles.
pub struct CycleDelay;

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = u64::from(ns) * u64::from(config::MCK_HZ) / 1_000_000_000;
        cortex_m::asm::delay(cycles.max(1) as u32);
    }
}
