// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Bounded busy-wait on a device status predicate.

use crate::error::Error;

/// Maximum number of attempts a polling loop may make.
///
/// A budget of zero still makes one attempt.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PollBudget(u32);

impl PollBudget {
    pub const fn new(attempts: u32) -> Self {
        Self(attempts)
    }

    /// Number of attempts the loop actually makes.
    #[inline]
    pub const fn attempts(&self) -> u32 {
        if self.0 == 0 {
            1
        } else {
            self.0
        }
    }
}

/// Poll `read_status` until `ready` holds for the returned status.
///
/// Returns the first ready status. A failing read aborts the wait with [`Error::Bus`]; running
/// out of attempts gives [`Error::DeviceTimeout`].
pub fn wait_ready<S, E, R, P>(mut read_status: R, ready: P, budget: PollBudget) -> Result<S, Error<E>>
where
    R: FnMut() -> Result<S, E>,
    P: Fn(&S) -> bool,
{
    for _ in 0..budget.attempts() {
        let status = read_status().map_err(Error::Bus)?;
        if ready(&status) {
            return Ok(status);
        }
        core::hint::spin_loop();
    }

    log::warn!("device not ready after {} polls", budget.attempts());
    Err(Error::DeviceTimeout)
}
