// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Digital inputs with edge flags.
//!
//! Eight logical inputs are spread over PIOD and PIOA. The PIO edge interrupt reports
//! `(port, pin, level)` to [`DigitalInputs::on_edge`]; the level is committed once it has been
//! stable for the debounce time. A committed high level sets the input's rising flag and clears
//! its falling flag, a committed low level does the opposite. The main loop consumes the flags.

use crate::{config, timer::TickHandler};

/// PIO controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Port {
    A,
    D,
}

/// Logical board input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Input {
    In1,
    In2,
    In3,
    In4,
    In5,
    In6,
    In7,
    In8,
}

pub const INPUT_COUNT: usize = 8;

/// Pin of each input, indexed by [`Input::index`].
const PIN_MAP: [(Port, u8); INPUT_COUNT] = [
    (Port::D, 22),
    (Port::D, 21),
    (Port::D, 23),
    (Port::A, 25),
    (Port::D, 24),
    (Port::A, 24),
    (Port::D, 25),
    (Port::D, 26),
];

impl Input {
    pub const ALL: [Input; INPUT_COUNT] = [
        Input::In1,
        Input::In2,
        Input::In3,
        Input::In4,
        Input::In5,
        Input::In6,
        Input::In7,
        Input::In8,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn pin(self) -> (Port, u8) {
        PIN_MAP[self as usize]
    }

    /// Input wired to `pin` on `port`, if any.
    pub fn from_pin(port: Port, pin: u8) -> Option<Input> {
        Input::ALL.into_iter().find(|i| i.pin() == (port, pin))
    }

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Interrupt mask of the inputs wired to `port`.
pub fn port_mask(port: Port) -> u32 {
    PIN_MAP
        .iter()
        .filter(|(p, _)| *p == port)
        .fold(0, |mask, (_, pin)| mask | 1u32 << pin)
}

/// Debounced levels and edge flags of all inputs.
pub struct DigitalInputs {
    stable: u8,
    pending: u8,
    rising: u8,
    falling: u8,
    debounce: [u32; INPUT_COUNT],
}

impl DigitalInputs {
    pub const fn new() -> Self {
        Self {
            stable: 0,
            pending: 0,
            rising: 0,
            falling: 0,
            debounce: [0; INPUT_COUNT],
        }
    }

    /// Record the levels present at power-on and flag each as an edge.
    ///
    /// Returns the levels as a bitmap, bit `n` for input `n + 1`. Runs inside the critical
    /// section shared with the edge interrupts, so it only samples; reporting is up to the caller.
    pub fn capture_power_on<F>(&mut self, mut read_level: F) -> u8
    where
        F: FnMut(Port, u8) -> bool,
    {
        for input in Input::ALL {
            let (port, pin) = input.pin();
            let level = read_level(port, pin);
            set_bit(&mut self.pending, input.bit(), level);
            self.commit(input, level);
        }
        self.stable
    }

    /// Edge interrupt. Returns the affected input, `None` for an unmapped pin.
    pub fn on_edge(&mut self, port: Port, pin: u8, level: bool) -> Option<Input> {
        let input = Input::from_pin(port, pin)?;
        set_bit(&mut self.pending, input.bit(), level);
        self.debounce[input.index()] = config::DEBOUNCE_MS;
        Some(input)
    }

    /// Debounced level.
    #[inline]
    pub fn level(&self, input: Input) -> bool {
        self.stable & input.bit() != 0
    }

    #[inline]
    pub fn rising(&self, input: Input) -> bool {
        self.rising & input.bit() != 0
    }

    #[inline]
    pub fn falling(&self, input: Input) -> bool {
        self.falling & input.bit() != 0
    }

    pub fn take_rising(&mut self, input: Input) -> bool {
        let set = self.rising(input);
        self.rising &= !input.bit();
        set
    }

    pub fn take_falling(&mut self, input: Input) -> bool {
        let set = self.falling(input);
        self.falling &= !input.bit();
        set
    }

    fn commit(&mut self, input: Input, level: bool) {
        set_bit(&mut self.stable, input.bit(), level);
        set_bit(&mut self.rising, input.bit(), level);
        set_bit(&mut self.falling, input.bit(), !level);
    }
}

impl Default for DigitalInputs {
    fn default() -> Self {
        Self::new()
    }
}

impl TickHandler for DigitalInputs {
    fn on_tick(&mut self) {
        for input in Input::ALL {
            let count = &mut self.debounce[input.index()];
            if *count == 0 {
                continue;
            }
            *count -= 1;
            if *count == 0 {
                let level = self.pending & input.bit() != 0;
                if level != self.level(input) {
                    self.commit(input, level);
                }
            }
        }
    }
}

#[inline]
fn set_bit(bits: &mut u8, bit: u8, on: bool) {
    if on {
        *bits |= bit;
    } else {
        *bits &= !bit;
    }
}
