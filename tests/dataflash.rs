// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

mod common;

use atsam4_drivers::{
    drivers::dataflash::{encode_address, opcode, AddressingMode, DataFlash, ReadyBudgets, CHIP_ERASE},
    hw::{ChipSelect, SpiBus},
    memory::status::PollBudget,
    Error,
};
use common::{spi_pair, At45};

fn binary_flash() -> (
    std::rc::Rc<std::cell::RefCell<At45>>,
    SpiBus<common::SimSpi<At45>>,
    DataFlash<common::SimCs<At45>>,
) {
    let dev = At45::shared(true);
    let (spi, cs) = spi_pair(&dev);
    let flash = DataFlash::with_mode(ChipSelect::active_low(cs), AddressingMode::Binary);
    (dev, SpiBus::new(spi), flash)
}

#[test]
fn init_accepts_matching_device() {
    let (dev, mut bus, mut flash) = binary_flash();

    let status = flash.init(&mut bus).unwrap();

    assert!(status.is_ready());
    assert_eq!(status.mode(), AddressingMode::Binary);
    assert_eq!(dev.borrow().opcodes(), vec![opcode::STATUS_READ]);
}

#[test]
fn init_reconfigures_page_size() {
    let dev = At45::shared(false);
    let (spi, cs) = spi_pair(&dev);
    let mut bus = SpiBus::new(spi);
    let mut flash = DataFlash::with_mode(ChipSelect::active_low(cs), AddressingMode::Binary);

    let status = flash.init(&mut bus).unwrap();

    assert_eq!(status.mode(), AddressingMode::Binary);
    let dev = dev.borrow();
    assert!(dev.binary);
    assert!(dev.commands.contains(&vec![0x3D, 0x2A, 0x80, 0xA6]));
    assert!(dev.commands.contains(&vec![0xF0, 0x00, 0x00, 0x00]));
}

#[test]
fn init_reports_mismatch_when_device_keeps_its_mode() {
    let dev = At45::shared(false);
    dev.borrow_mut().sticky_mode = true;
    let (spi, cs) = spi_pair(&dev);
    let mut bus = SpiBus::new(spi);
    let mut flash = DataFlash::with_mode(ChipSelect::active_low(cs), AddressingMode::Binary);

    assert_eq!(flash.init(&mut bus), Err(Error::ConfigMismatch));
    assert!(!bus.is_busy());
}

#[test]
fn write_spanning_pages_is_split_and_reads_back() {
    let (dev, mut bus, mut flash) = binary_flash();
    let data: Vec<u8> = (0..40).collect();

    flash.write(&mut bus, 500, &data).unwrap();

    {
        let dev = dev.borrow();
        let rmw: Vec<&Vec<u8>> = dev.commands.iter().filter(|c| c[0] == opcode::READ_MODIFY_WRITE).collect();
        assert_eq!(rmw.len(), 2);
        assert_eq!(rmw[0][1..4], encode_address(0, 500, AddressingMode::Binary));
        assert_eq!(rmw[0].len() - 4, 12);
        assert_eq!(rmw[1][1..4], encode_address(1, 0, AddressingMode::Binary));
        assert_eq!(rmw[1].len() - 4, 28);
        assert_eq!(&dev.page(0)[500..], &data[..12]);
        assert_eq!(&dev.page(1)[..28], &data[12..]);
    }

    let mut back = [0u8; 40];
    flash.read(&mut bus, 500, &mut back).unwrap();
    assert_eq!(back.as_slice(), data.as_slice());
}

#[test]
fn write_preserves_rest_of_page() {
    let (dev, mut bus, mut flash) = binary_flash();
    dev.borrow_mut().memory[512..1024].fill(0x11);

    flash.write(&mut bus, 512 + 100, &[1, 2, 3]).unwrap();

    let dev = dev.borrow();
    assert_eq!(dev.page(1)[99], 0x11);
    assert_eq!(dev.page(1)[100..103], [1, 2, 3]);
    assert_eq!(dev.page(1)[103], 0x11);
}

#[test]
fn page_write_programs_through_buffer_with_erase() {
    let (dev, mut bus, mut flash) = binary_flash();
    dev.borrow_mut().memory[1024..1536].fill(0x11);

    flash.page_write(&mut bus, 2, 10, &[0xAA, 0xBB]).unwrap();

    let dev = dev.borrow();
    let last = dev.commands.last().unwrap();
    assert_eq!(last[0], opcode::STATUS_READ);
    assert!(dev.opcodes().contains(&opcode::PROGRAM_ERASE));
    assert_eq!(dev.page(2)[10..12], [0xAA, 0xBB]);
    assert_eq!(dev.page(2)[9], 0xFF);
    assert_eq!(dev.page(2)[12], 0xFF);
}

#[test]
fn page_read_clocks_dummy_bytes() {
    let (dev, mut bus, mut flash) = binary_flash();
    dev.borrow_mut().memory[3 * 512 + 7..3 * 512 + 10].copy_from_slice(&[7, 8, 9]);

    let mut buf = [0u8; 3];
    flash.page_read(&mut bus, 3, 7, &mut buf).unwrap();

    assert_eq!(buf, [7, 8, 9]);
    let dev = dev.borrow();
    let cmd = dev.commands.last().unwrap();
    assert_eq!(cmd[0], opcode::PAGE_READ);
    assert_eq!(cmd.len(), 1 + 3 + 4 + 3);
}

#[test]
fn erase_page_addresses_byte_zero() {
    let (dev, mut bus, mut flash) = binary_flash();
    dev.borrow_mut().memory[5 * 512..6 * 512].fill(0);

    flash.erase_page(&mut bus, 5).unwrap();

    let dev = dev.borrow();
    let erase = dev.commands.iter().find(|c| c[0] == opcode::PAGE_ERASE).unwrap();
    assert_eq!(erase[1..], encode_address(5, 0, AddressingMode::Binary));
    assert!(dev.page(5).iter().all(|&b| b == 0xFF));
}

#[test]
fn program_waits_for_ready() {
    let (dev, mut bus, mut flash) = binary_flash();
    dev.borrow_mut().busy_polls = 3;

    flash.page_write(&mut bus, 0, 0, &[1]).unwrap();

    // Three busy reads and the ready one.
    assert_eq!(dev.borrow().status_reads, 4);
}

#[test]
fn wait_ready_times_out() {
    let (dev, mut bus, mut flash) = binary_flash();
    dev.borrow_mut().never_ready = true;

    let res = flash.wait_ready(&mut bus, PollBudget::new(10));

    assert_eq!(res, Err(Error::DeviceTimeout));
    assert_eq!(dev.borrow().status_reads, 10);
    assert!(!bus.is_busy());
}

#[test]
fn out_of_range_issues_nothing() {
    let (dev, mut bus, mut flash) = binary_flash();
    let capacity = flash.region().capacity();

    let mut buf = [0u8; 8];
    assert_eq!(flash.read(&mut bus, capacity - 4, &mut buf), Err(Error::OutOfRange));
    assert_eq!(flash.page_write(&mut bus, 8192, 0, &[0]), Err(Error::OutOfRange));
    assert_eq!(flash.page_write(&mut bus, 0, 510, &[0; 4]), Err(Error::OutOfRange));
    assert!(dev.borrow().commands.is_empty());
}

#[test]
fn binary_capacity() {
    let (_, _, flash) = binary_flash();
    assert_eq!(flash.region().page_count(), 8192);
    assert_eq!(flash.region().capacity(), 8192 * 512);
}

#[test]
fn standard_mode_write_crosses_pages_and_reads_back() {
    let dev = At45::shared(false);
    let (spi, cs) = spi_pair(&dev);
    let mut bus = SpiBus::new(spi);
    let mut flash = DataFlash::with_mode(ChipSelect::active_low(cs), AddressingMode::Standard);
    let data: Vec<u8> = (0..1100u32).map(|i| (i * 7 % 251) as u8).collect();

    flash.init(&mut bus).unwrap();
    flash.write(&mut bus, 527, &data).unwrap();

    {
        let dev = dev.borrow();
        assert!(!dev.binary);
        let rmw: Vec<&Vec<u8>> = dev.commands.iter().filter(|c| c[0] == opcode::READ_MODIFY_WRITE).collect();
        let lens: Vec<usize> = rmw.iter().map(|c| c.len() - 4).collect();
        assert_eq!(lens, vec![1, 528, 528, 43]);
        assert_eq!(rmw[0][1..4], encode_address(0, 527, AddressingMode::Standard));
        assert_eq!(rmw[3][1..4], encode_address(3, 0, AddressingMode::Standard));
        assert_eq!(dev.page(0)[527], data[0]);
        assert_eq!(dev.page(1), &data[1..529]);
        assert_eq!(&dev.page(3)[..43], &data[1057..]);
        assert_eq!(dev.page(3)[43], 0xFF);
    }

    let mut back = vec![0u8; data.len()];
    flash.read(&mut bus, 527, &mut back).unwrap();
    assert_eq!(back, data);
}

#[test]
fn write_past_capacity_issues_nothing() {
    let (dev, mut bus, mut flash) = binary_flash();
    let capacity = flash.region().capacity();

    assert_eq!(flash.write(&mut bus, capacity - 10, &[0; 20]), Err(Error::OutOfRange));
    assert_eq!(flash.write(&mut bus, capacity, &[0]), Err(Error::OutOfRange));
    assert!(dev.borrow().commands.is_empty());

    flash.write(&mut bus, capacity - 10, &[0x5A; 10]).unwrap();
    assert_eq!(dev.borrow().page(8191)[502..], [0x5A; 10]);
}

#[test]
fn chip_erase_leaves_every_byte_erased() {
    let (dev, mut bus, mut flash) = binary_flash();
    dev.borrow_mut().memory.fill(0);

    flash.chip_erase(&mut bus).unwrap();

    assert!(dev.borrow().commands.contains(&CHIP_ERASE.to_vec()));
    let capacity = flash.region().capacity();
    for offset in [0, 511, 512 * 4000 + 3, capacity - 64] {
        let mut buf = [0u8; 64];
        flash.read(&mut bus, offset, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xFF), "offset {offset}");
    }
}

#[test]
fn chip_erase_waits_past_page_erase_budget() {
    let (dev, mut bus, flash) = binary_flash();
    let mut flash = flash.with_budgets(ReadyBudgets {
        program: PollBudget::new(10),
        erase: PollBudget::new(10),
        chip_erase: PollBudget::new(100),
    });
    dev.borrow_mut().busy_polls = 50;

    assert_eq!(flash.erase_page(&mut bus, 0), Err(Error::DeviceTimeout));

    dev.borrow_mut().status_reads = 0;
    flash.chip_erase(&mut bus).unwrap();
    assert_eq!(dev.borrow().status_reads, 51);
}

#[test]
fn buffer_two_program_opcode_skips_erase() {
    assert_eq!(opcode::PROGRAM_NO_ERASE_BUF2, 0x85);
    assert_ne!(opcode::PROGRAM_NO_ERASE_BUF2, opcode::PROGRAM_ERASE);
}
