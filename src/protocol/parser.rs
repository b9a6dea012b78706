// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time parser for RTC time-set frames.
//!
//! Field bytes are binary, so an end byte can also be a legal field value (36 minutes is `$`).
//! The end byte therefore only closes a frame once the body holds a whole command; before that
//! it is stored as data.

use heapless::Vec;

use crate::protocol::messages::*;

/// Longest frame body: `D T date month year day`.
const MAX_BODY: usize = 6;

enum State {
    WaitStart,
    Body,
}

enum Body {
    Incomplete,
    Invalid,
    Complete(TimeSetCommand),
}

pub struct TimeSetParser {
    state: State,
    body: Vec<u8, MAX_BODY>,
}

impl TimeSetParser {
    pub const fn new() -> Self {
        Self {
            state: State::WaitStart,
            body: Vec::new(),
        }
    }

    /// Process a single incoming byte. Returns `Some(TimeSetCommand)` if a complete frame is
    /// received.
    pub fn push(&mut self, byte: u8) -> Option<TimeSetCommand> {
        match self.state {
            State::WaitStart => {
                if byte == START_BYTE {
                    self.state = State::Body;
                    self.body.clear();
                }
            }
            State::Body => {
                if byte == END_BYTE {
                    match classify(&self.body) {
                        Body::Complete(cmd) => {
                            self.state = State::WaitStart;
                            return Some(cmd);
                        }
                        Body::Invalid => {
                            log::debug!("time-set: dropped frame {:02x?}", self.body.as_slice());
                            self.state = State::WaitStart;
                            return None;
                        }
                        Body::Incomplete => {}
                    }
                }
                if self.body.push(byte).is_err() {
                    // Overlong frame, resynchronise on the next start byte.
                    self.state = State::WaitStart;
                }
            }
        }
        None
    }
}

impl Default for TimeSetParser {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(body: &[u8]) -> Body {
    let cmd = if let Some(fields) = body.strip_prefix(DATE_TAG) {
        match *fields {
            [date, month, year, day] => TimeSetCommand::Date {
                date,
                month,
                year,
                day,
            },
            _ if fields.len() < 4 => return Body::Incomplete,
            _ => return Body::Invalid,
        }
    } else if let Some(fields) = body.strip_prefix(TIME_TAG) {
        match *fields {
            [hours, minutes, seconds] => TimeSetCommand::Time {
                hours,
                minutes,
                seconds,
            },
            _ if fields.len() < 3 => return Body::Incomplete,
            _ => return Body::Invalid,
        }
    } else if body == &DATE_TAG[..1] {
        return Body::Incomplete;
    } else {
        return Body::Invalid;
    };

    if cmd.is_valid() {
        Body::Complete(cmd)
    } else {
        Body::Invalid
    }
}
