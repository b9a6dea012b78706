// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Timer Counter (TC) clock selection for the tick interrupt.
//!
//! A TC channel with RC-compare trigger counts up to RC, restarts and raises an interrupt. The
//! counter is 16 bits wide, so for a given tick frequency we pick the fastest input clock whose
//! RC value still fits.

/// TC input clock selection (TCCLKS field).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TcClock {
    /// MCK / 2
    Clock1,
    /// MCK / 8
    Clock2,
    /// MCK / 32
    Clock3,
    /// MCK / 128
    Clock4,
    /// Slow clock
    Clock5,
}

impl TcClock {
    const ALL: [TcClock; 5] = [
        TcClock::Clock1,
        TcClock::Clock2,
        TcClock::Clock3,
        TcClock::Clock4,
        TcClock::Clock5,
    ];

    /// TCCLKS register value.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Input frequency of this clock given the master clock.
    pub const fn input_hz(self, mck: u32, slow_clock: u32) -> u32 {
        match self {
            TcClock::Clock1 => mck / 2,
            TcClock::Clock2 => mck / 8,
            TcClock::Clock3 => mck / 32,
            TcClock::Clock4 => mck / 128,
            TcClock::Clock5 => slow_clock,
        }
    }
}

/// Clock selection and compare value producing a given interrupt rate.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickTimerConfig {
    pub clock: TcClock,
    pub rc: u16,
}

impl TickTimerConfig {
    /// Pick the fastest clock able to produce `freq_hz` interrupts.
    ///
    /// `None` if the frequency is zero or outside every clock's range.
    pub fn for_frequency(mck: u32, slow_clock: u32, freq_hz: u32) -> Option<Self> {
        if freq_hz == 0 {
            return None;
        }
        for clock in TcClock::ALL {
            let high = clock.input_hz(mck, slow_clock);
            let low = high / 65_536;
            if freq_hz > high {
                return None;
            }
            if freq_hz >= low {
                if let Ok(rc) = u16::try_from(high / freq_hz) {
                    return Some(Self { clock, rc });
                }
            }
        }
        None
    }
}
