// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! AT24C64-class I2C EEPROM (64 Kbit, 32-byte pages) with an EUI-48 node address.
//!
//! Registers are addressed with two bytes, MSB first. The write-protect pin is released (low)
//! only for the duration of each write and the device is given its write cycle time afterwards.

use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};

use crate::{config, error::Error, memory::paging::MemoryRegion};

/// Page size in bytes.
pub const PAGE_SIZE: usize = config::EEPROM_PAGE_SIZE as usize;

/// Byte value of an erased cell.
pub const ERASED: u8 = 0xFF;

/// EEPROM on an I2C bus with its write-protect pin and a delay source.
pub struct Eeprom<I2C, WP, D> {
    i2c: I2C,
    wp: WP,
    delay: D,
    region: MemoryRegion,
}

impl<I2C, WP, D> Eeprom<I2C, WP, D>
where
    I2C: I2c,
    WP: OutputPin,
    D: DelayNs,
{
    /// Take the bus, write-protect pin and delay. The device starts write-protected.
    pub fn new(i2c: I2C, mut wp: WP, delay: D) -> Self {
        wp.set_high().ok();
        Self {
            i2c,
            wp,
            delay,
            region: MemoryRegion::new(config::EEPROM_CAPACITY, config::EEPROM_PAGE_SIZE),
        }
    }

    pub fn free(self) -> (I2C, WP, D) {
        (self.i2c, self.wp, self.delay)
    }

    #[inline]
    pub fn region(&self) -> &MemoryRegion {
        &self.region
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), Error<I2C::Error>> {
        self.write(addr, &[value])
    }

    pub fn read_byte(&mut self, addr: u16) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.read(addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Write `data` starting at `addr`, one page-bounded piece per bus write.
    pub fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let region = self.region;
        for chunk in region.plan_transfer(u32::from(addr), data.len())? {
            let at = region.offset_of(chunk.page, chunk.byte_in_page) as u16;
            self.write_page(at, &data[chunk.buffer_range()])?;
        }
        Ok(())
    }

    /// Sequential read starting at `addr`.
    pub fn read(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        self.region.check_range(u32::from(addr), buf.len())?;
        self.i2c
            .write_read(config::EEPROM_ADDR, &addr.to_be_bytes(), buf)
            .map_err(Error::Bus)
    }

    /// Set every byte of the array to [`ERASED`].
    pub fn erase(&mut self) -> Result<(), Error<I2C::Error>> {
        log::debug!("eeprom: erase {} bytes", self.region.capacity());
        let blank = [ERASED; PAGE_SIZE];
        for page in 0..self.region.page_count() {
            let at = self.region.offset_of(page, 0) as u16;
            self.write_page(at, &blank)?;
        }
        Ok(())
    }

    /// Read the factory-programmed EUI-48 node address.
    pub fn read_eui48(&mut self) -> Result<[u8; 6], Error<I2C::Error>> {
        let mut eui = [0u8; 6];
        self.i2c
            .write_read(config::EEPROM_EUI_ADDR, &[config::EEPROM_EUI_REG], &mut eui)
            .map_err(Error::Bus)?;
        Ok(eui)
    }

    /// One bus write of at most a page, bracketed by write-protect release and re-assert.
    fn write_page(&mut self, addr: u16, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let mut frame = [0u8; 2 + PAGE_SIZE];
        frame[..2].copy_from_slice(&addr.to_be_bytes());
        frame[2..2 + data.len()].copy_from_slice(data);

        self.wp.set_low().ok();
        let res = self.i2c.write(config::EEPROM_ADDR, &frame[..2 + data.len()]);
        self.wp.set_high().ok();
        self.delay.delay_ms(config::EEPROM_WRITE_CYCLE_MS);

        res.map_err(|e| {
            log::warn!("eeprom: write at {:#06x} failed", addr);
            Error::Bus(e)
        })
    }
}
