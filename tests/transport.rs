// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

mod common;

use atsam4_drivers::{
    config,
    drivers::Rs485,
    hw::{
        transport::{self, ByteTransport},
        Led, Usart,
    },
    memory::status::PollBudget,
    Error,
};
use common::{event_log, Event, LinkDown, MockTransport, RecordingDelay, RecordingPin};

#[test]
fn send_blocking_retries_while_busy() {
    let mut t = MockTransport::new();
    t.busy_sends = 3;

    transport::send_blocking(&mut t, b"abc", PollBudget::new(4)).unwrap();

    assert_eq!(t.sent, b"abc");
}

#[test]
fn send_blocking_gives_up_on_stuck_transport() {
    let mut t = MockTransport::new();
    t.busy_sends = 100;

    let res = transport::send_blocking(&mut t, b"abc", PollBudget::new(10));

    assert_eq!(res, Err(Error::TransportBusy));
    assert!(t.sent.is_empty());
}

#[test]
fn send_blocking_passes_link_errors_through() {
    let mut t = MockTransport::new();
    t.fail_send = true;

    assert_eq!(
        transport::send_blocking(&mut t, b"x", PollBudget::new(10)),
        Err(Error::Bus(LinkDown))
    );
}

#[test]
fn flush_waits_then_times_out() {
    let t = MockTransport::new();
    t.draining.set(5);
    assert_eq!(transport::flush(&t, PollBudget::new(6)), Ok(()));

    let stuck = MockTransport {
        never_drains: true,
        ..MockTransport::new()
    };
    assert_eq!(transport::flush(&stuck, PollBudget::new(6)), Err(Error::DeviceTimeout));
}

#[test]
fn receive_exact_fills_buffer_or_times_out() {
    let mut t = MockTransport::new();
    t.rx.extend([1, 2, 3]);

    let mut buf = [0u8; 3];
    transport::receive_exact(&mut t, &mut buf, PollBudget::new(1)).unwrap();
    assert_eq!(buf, [1, 2, 3]);

    let mut buf = [0u8; 1];
    assert_eq!(
        transport::receive_exact(&mut t, &mut buf, PollBudget::new(5)),
        Err(Error::DeviceTimeout)
    );
}

#[test]
fn usart_splits_long_messages() {
    let mut usart = Usart::new(MockTransport::new());
    let msg = vec![b'x'; config::UART_TX_CAPACITY * 2 + 10];

    usart.send(&msg).unwrap();

    let t = usart.free();
    let sizes: Vec<usize> = t.messages.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![config::UART_TX_CAPACITY, config::UART_TX_CAPACITY, 10]);
    assert_eq!(t.sent, msg);
}

#[test]
fn usart_print_helpers() {
    use core::fmt::Write;

    let mut usart = Usart::new(MockTransport::new());
    usart.print_hex_u8(0x3C);
    usart.write_byte(b' ');
    usart.print_hex_u32(0xDEAD_BEEF);
    usart.write_byte(b' ');
    usart.print_u32(4096);
    write!(usart, " {}", -7).unwrap();
    usart.println("");

    assert_eq!(usart.free().sent, b"0x3C 0xDEAD_BEEF 4096 -7\r\n");
}

#[test]
fn rs485_send_drives_direction_and_led() {
    let log = event_log();
    let mut rs485 = Rs485::new(MockTransport::new(), RecordingPin::new("en", &log), RecordingDelay::new(&log));
    let mut led = Led::active_low(RecordingPin::new("led", &log));
    log.borrow_mut().clear();

    rs485.send(b"hello", &mut led).unwrap();

    assert_eq!(
        log.borrow().as_slice(),
        &[
            Event::Pin { name: "en", high: true },
            Event::Pin { name: "led", high: false },
            Event::DelayNs(1_000_000),
            Event::Pin { name: "led", high: true },
            Event::Pin { name: "en", high: false },
        ]
    );
    assert_eq!(rs485.transport().sent, b"hello");
}

#[test]
fn rs485_failed_send_returns_to_receive() {
    let log = event_log();
    let stuck = MockTransport {
        never_drains: true,
        ..MockTransport::new()
    };
    let mut rs485 = Rs485::new(stuck, RecordingPin::new("en", &log), RecordingDelay::new(&log));
    let mut led = Led::active_low(RecordingPin::new("led", &log));
    log.borrow_mut().clear();

    assert_eq!(rs485.send(b"x", &mut led), Err(Error::DeviceTimeout));

    let last_two: Vec<Event> = log.borrow().iter().rev().take(2).cloned().collect();
    assert_eq!(
        last_two,
        vec![
            Event::Pin { name: "en", high: false },
            Event::Pin { name: "led", high: true },
        ]
    );
}

#[test]
fn rs485_receive_reads_transport() {
    let log = event_log();
    let mut t = MockTransport::new();
    t.rx.push_back(0x42);
    let mut rs485 = Rs485::new(t, RecordingPin::new("en", &log), RecordingDelay::new(&log));

    assert_eq!(rs485.receive(), Ok(0x42));
    assert_eq!(rs485.receive(), Err(nb::Error::WouldBlock));
}
