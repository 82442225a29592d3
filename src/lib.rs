//! Bit-banged I2C master.
//!
//! The protocol engine (start, repeated start and stop conditions, byte
//! shifting, acknowledgement handling, 7-bit and 10-bit addressing and
//! multi-message transactions) runs entirely on top of a [`Capabilities`]
//! implementation supplied by the platform: two pins, a microsecond delay
//! and an optional lock. No hardware I2C peripheral is involved.
//!
//! ```text
//! SoftI2c::transfer ── lock ── start ── per message: [restart] address data ── stop ── unlock
//!                                                      │
//!                                                  BitLayer
//!                                                      │
//!                                                Capabilities
//! ```
//!
//! Every transfer is blocking and busy-waits through the platform's delay.
//! Failures are reported by the number of serviced messages and, when that
//! falls short, through [`Capabilities::on_error`].

#[macro_use]
extern crate log;

pub mod bit_layer;
pub mod port;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use bit_layer::{BitLayer, Capabilities, Error, RWBit};
pub use transfer::{Buffer, Flags, Message, SoftI2c};
