// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error type shared by the memory layer and the device drivers.
//!
//! Every condition is local and recoverable: operations return it to the immediate caller.
//! Bus-level failures from the underlying `embedded-hal` implementation are carried in
//! [`Error::Bus`].

use core::fmt;

/// Driver error, generic over the bus error `E`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// Offset, length or page index exceeds the device capacity or page size.
    OutOfRange,
    /// A ready/status poll exhausted its retry budget.
    DeviceTimeout,
    /// A new bus transaction or transmission was started while one is still in flight.
    TransportBusy,
    /// The device reports an addressing mode different from the compiled one.
    ConfigMismatch,
    /// Error reported by the bus implementation.
    Bus(E),
}

impl<E> Error<E> {
    /// Map the bus error, keeping every other variant.
    pub fn map_bus<F, O>(self, f: O) -> Error<F>
    where
        O: FnOnce(E) -> F,
    {
        match self {
            Error::OutOfRange => Error::OutOfRange,
            Error::DeviceTimeout => Error::DeviceTimeout,
            Error::TransportBusy => Error::TransportBusy,
            Error::ConfigMismatch => Error::ConfigMismatch,
            Error::Bus(e) => Error::Bus(f(e)),
        }
    }
}

impl<E> Error<Error<E>> {
    /// Collapse an error raised by a fallible poll inside another driver operation.
    pub fn flatten(self) -> Error<E> {
        match self {
            Error::OutOfRange => Error::OutOfRange,
            Error::DeviceTimeout => Error::DeviceTimeout,
            Error::TransportBusy => Error::TransportBusy,
            Error::ConfigMismatch => Error::ConfigMismatch,
            Error::Bus(inner) => inner,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfRange => f.write_str("offset or length out of range"),
            Error::DeviceTimeout => f.write_str("device did not become ready in time"),
            Error::TransportBusy => f.write_str("transport busy"),
            Error::ConfigMismatch => f.write_str("device configuration mismatch"),
            Error::Bus(e) => write!(f, "bus error: {:?}", e),
        }
    }
}

/// A transfer or page access that does not fit the memory region.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RangeError;

impl<E> From<RangeError> for Error<E> {
    fn from(_: RangeError) -> Self {
        Error::OutOfRange
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("offset or length out of range")
    }
}
