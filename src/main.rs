// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use core::{
    cell::RefCell,
    fmt::Write as _,
    sync::atomic::{AtomicBool, Ordering},
};

use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use critical_section::Mutex;
use embedded_hal::digital::PinState;
use heapless::{String, Vec};
use log::LevelFilter;
use panic_halt as _;

use atsam4_hal::pac::{self, interrupt, Interrupt};

use atsam4_drivers::{
    config,
    drivers::{DataFlash, Ds1339, Eeprom, Rs485, RtcMonitor, Sram},
    hw::{
        input::{port_mask, Input, Port},
        pins::{self, Bank},
        ByteTransport, ChipSelect, SpiBus, StatusLeds, TickTimerConfig, Usart, WatchdogConfig,
    },
    logging::SerialLogger,
    protocol::TimeSetParser,
    system::SystemTimers,
    timer::Dispatcher,
};

mod board;
use board::{CycleDelay, Pio, SerialPort, Spi0, TickTimer, Twi0, Watchdog};

static LOGGER: SerialLogger<SerialPort<pac::UART0>> = SerialLogger::new(LevelFilter::Debug);
static DISPATCHER: Dispatcher = Dispatcher::new();
static TIMERS: Mutex<RefCell<SystemTimers>> = Mutex::new(RefCell::new(SystemTimers::new()));
static TICK: Mutex<RefCell<Option<TickTimer>>> = Mutex::new(RefCell::new(None));
static RTC_ALARM: AtomicBool = AtomicBool::new(false);

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

#[entry]
fn main() -> ! {
    let Some(dp) = pac::Peripherals::take() else {
        halt()
    };

    // Clocks: the HAL's pre-init hook has already started the PLL at MCK_HZ.
    board::enable_peripheral_clocks(
        &dp.PMC,
        &[
            Interrupt::UART0,
            Interrupt::PIOA,
            Interrupt::PIOB,
            Interrupt::PIOD,
            Interrupt::USART0,
            Interrupt::TWI0,
            Interrupt::SPI,
            Interrupt::TC0,
        ],
    );
    let pio = Pio::new(dp.PIOA, dp.PIOB, dp.PIOD);

    // UART0 (DBG)
    LOGGER.attach(Usart::new(SerialPort::init_uart0(dp.UART0, &pio, config::DEBUG_BAUD)));
    // SAFETY: the handlers only touch state behind critical sections.
    unsafe { NVIC::unmask(Interrupt::UART0) };
    log::set_logger(&LOGGER).ok();
    log::set_max_level(LOGGER.level());
    log::info!("boot");

    // LEDs
    let mut leds = StatusLeds::new(
        pio.output(pins::LED_POWER, PinState::High),
        pio.output(pins::LED_RS485_RX, PinState::High),
        pio.output(pins::LED_RS485_TX, PinState::High),
    );
    leds.all_off();
    leds.power.on();

    // SPI: DataFlash and SRAM, write-protect released first
    let _spi_mem_wp = pio.output(pins::SPI_MEM_WP, PinState::High);
    let mut spi_bus = SpiBus::new(Spi0::new(dp.SPI, &pio, config::SPI_CLOCK_HZ));
    let mut flash = DataFlash::new(ChipSelect::active_low(pio.output(pins::FLASH_CS, PinState::High)));
    let mut sram = Sram::new(ChipSelect::active_low(pio.output(pins::SRAM_CS, PinState::High)));

    match flash.init(&mut spi_bus) {
        Ok(status) => log::info!("flash ready, status {:02x?}", status.raw()),
        Err(e) => {
            log::error!("flash init failed: {}", e);
            halt()
        }
    }
    match sram.init(&mut spi_bus) {
        Ok(mode) => log::info!("sram in {:?} mode", mode),
        Err(e) => log::warn!("sram init failed: {}", e),
    }

    // TWI0: EEPROM and RTC
    let mut twi = Twi0::new(dp.TWI0, &pio, config::I2C_SPEED_HZ);
    {
        let wp = pio.output(pins::EEPROM_WP, PinState::High);
        let mut eeprom = Eeprom::new(&mut twi, wp, CycleDelay);
        match eeprom.read_eui48() {
            Ok(eui) => log::info!("node address {:02x?}", eui),
            Err(e) => log::warn!("EUI-48 read failed: {}", e),
        }
    }
    let mut rtc = Ds1339::new(twi);
    if let Err(e) = rtc.configure_second_alarm() {
        log::warn!("rtc alarm setup failed: {}", e);
    }
    let mut rtc_monitor = RtcMonitor::new();
    pio.falling_edge_input(pins::RTC_INT);

    // USART0: RS485
    let mut rs485 = Rs485::new(
        SerialPort::init_usart0(dp.USART0, &pio, config::RS485_BAUD),
        pio.output(pins::RS485_EN, PinState::Low),
        CycleDelay,
    );

    // Digital inputs
    pio.edge_inputs(Bank::A, port_mask(Port::A));
    pio.edge_inputs(Bank::D, port_mask(Port::D));
    let levels = critical_section::with(|cs| {
        TIMERS
            .borrow_ref_mut(cs)
            .inputs
            .capture_power_on(|port, pin| board::pin_level(port.into(), pin))
    });
    log::debug!("inputs at power-on: {:#010b}", levels);

    // TC0: 1 ms tick
    let Some(tick) = TickTimerConfig::for_frequency(config::MCK_HZ, config::SLOW_CLOCK_HZ, config::TICK_HZ)
    else {
        log::error!("no TC clock for {} Hz", config::TICK_HZ);
        halt()
    };
    let tick = TickTimer::start(dp.TC0, tick);
    critical_section::with(|cs| *TICK.borrow_ref_mut(cs) = Some(tick));

    // SAFETY: see UART0 above.
    unsafe {
        NVIC::unmask(Interrupt::TC0);
        NVIC::unmask(Interrupt::USART0);
        NVIC::unmask(Interrupt::PIOA);
        NVIC::unmask(Interrupt::PIOD);
    }

    let mut console = SerialPort::uart0();
    let mut parser = TimeSetParser::new();
    let mut rs485_frame: Vec<u8, 64> = Vec::new();

    // Watchdog: reset unless the loop below restarts it within the period.
    let Some(wdt_cfg) = WatchdogConfig::for_period(config::WATCHDOG_PERIOD_MS, config::SLOW_CLOCK_HZ) else {
        log::error!("no watchdog setting for {} ms", config::WATCHDOG_PERIOD_MS);
        halt()
    };
    let watchdog = Watchdog::start(dp.WDT, wdt_cfg);

    loop {
        watchdog.feed();

        // Time-set commands on the debug console
        while let Ok(b) = console.receive() {
            if let Some(cmd) = parser.push(b) {
                match rtc.apply(cmd) {
                    Ok(()) => log::info!("rtc set: {:?}", cmd),
                    Err(e) => log::warn!("rtc set failed: {}", e),
                }
            }
        }

        // RS485 receive
        while let Ok(b) = rs485.receive() {
            if rs485_frame.push(b).is_err() {
                log::warn!("rs485 frame overflow");
                rs485_frame.clear();
            }
        }

        let (heartbeat, gap_end, in_frame, edges) = critical_section::with(|cs| {
            let mut t = TIMERS.borrow_ref_mut(cs);
            let edges = Input::ALL.map(|i| (t.inputs.take_rising(i), t.inputs.take_falling(i)));
            (t.general.take(), t.rs485_gap.take_error(), t.rs485_gap.in_frame(), edges)
        });

        leds.rx.set(in_frame);
        if gap_end && !rs485_frame.is_empty() {
            log::debug!("rs485 frame {:02x?}", rs485_frame.as_slice());
            rs485_frame.clear();
        }

        for (input, (rise, fall)) in Input::ALL.into_iter().zip(edges) {
            if rise {
                log::info!("{:?} high", input);
            }
            if fall {
                log::info!("{:?} low", input);
            }
        }

        if heartbeat {
            leds.power.toggle();
        }

        // Once-per-second clock read
        if RTC_ALARM.swap(false, Ordering::AcqRel) {
            rtc_monitor.on_alarm_pin();
        }
        match rtc_monitor.poll(&mut rtc) {
            Ok(Some(now)) => {
                log::debug!("{}", now);
                if rtc_monitor.take_report() {
                    let mut line: String<40> = String::new();
                    let _ = write!(line, "{}\r\n", now);
                    if let Err(e) = rs485.send(line.as_bytes(), &mut leds.tx) {
                        log::warn!("time report failed: {}", e);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("rtc read failed: {}", e),
        }

        cortex_m::asm::wfi();
    }
}

/// Feed the input edges in `isr` to the debouncer.
fn dispatch_edges(port: Port, isr: u32) {
    let mask = isr & port_mask(port);
    if mask == 0 {
        return;
    }
    critical_section::with(|cs| {
        let mut timers = TIMERS.borrow_ref_mut(cs);
        for pin in (0..32u8).filter(|p| mask & 1 << p != 0) {
            timers.inputs.on_edge(port, pin, board::pin_level(port.into(), pin));
        }
    });
}

#[interrupt]
fn TC0() {
    critical_section::with(|cs| {
        if TICK.borrow_ref(cs).as_ref().is_some_and(TickTimer::take_tick) {
            TIMERS.borrow_ref_mut(cs).tick(&DISPATCHER);
        }
    });
}

#[interrupt]
fn UART0() {
    SerialPort::uart0().service();
}

#[interrupt]
fn USART0() {
    if SerialPort::usart0().service().is_some() {
        critical_section::with(|cs| TIMERS.borrow_ref_mut(cs).rs485_gap.on_byte());
    }
}

#[interrupt]
fn PIOA() {
    dispatch_edges(Port::A, board::take_pin_interrupts(Bank::A));
}

#[interrupt]
fn PIOD() {
    let isr = board::take_pin_interrupts(Bank::D);
    dispatch_edges(Port::D, isr);

    if isr & pins::RTC_INT.mask() != 0 && !board::pin_level(pins::RTC_INT.bank, pins::RTC_INT.index) {
        RTC_ALARM.store(true, Ordering::Release);
    }
}
