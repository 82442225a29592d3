mod address;
mod engine;
mod message;

pub use self::address::{seven_bit, ten_bit_header, ten_bit_low};
pub use self::engine::Outcome;
pub use self::message::{Buffer, Flags, Message};

use self::engine::BusLock;
use crate::bit_layer::Capabilities;

/// First and last address probed by [`SoftI2c::scan`]; the rest are reserved.
pub const SCAN_FIRST: u16 = 0x08;
pub const SCAN_LAST: u16 = 0x77;

/// Master side of a bit-banged bus.
///
/// Borrows the caller's [`Capabilities`] for its whole lifetime. Every
/// call is one transaction: the bus lock is taken, the messages run between
/// a single start and stop, and the lock is released again, whatever the
/// outcome.
pub struct SoftI2c<'a, C>
where
    C: Capabilities + ?Sized,
{
    pins: &'a mut C,
}

impl<'a, C> SoftI2c<'a, C>
where
    C: Capabilities + ?Sized,
{
    pub fn new(pins: &'a mut C) -> Self {
        SoftI2c { pins }
    }

    /// Runs `messages` as one transaction and returns how many were fully serviced.
    ///
    /// When that is fewer than requested the platform's
    /// [`Capabilities::on_error`] is called once with the cause.
    pub fn transfer(&mut self, messages: &mut [Message]) -> usize {
        let requested = messages.len();
        let outcome = self.run(messages);

        if outcome.serviced != requested {
            warn!("Transfer serviced {} of {} messages", outcome.serviced, requested);
            if let Some(error) = outcome.failure {
                self.pins.on_error(error);
            }
        }

        outcome.serviced
    }

    /// Writes `data` to `address`.
    pub fn send(&mut self, address: u16, flags: Flags, data: &[u8]) -> usize {
        self.transfer(&mut [Message::write(address, data).with_flags(flags)])
    }

    /// Reads `buf.len()` bytes from `address`.
    pub fn recv(&mut self, address: u16, flags: Flags, buf: &mut [u8]) -> usize {
        self.transfer(&mut [Message::read(address, buf).with_flags(flags)])
    }

    /// Writes `tx`, then reads into `rx` after a repeated start. Typically a
    /// register pointer followed by its value.
    pub fn send_then_recv(&mut self, address: u16, tx: &[u8], rx: &mut [u8]) -> usize {
        self.transfer(&mut [Message::write(address, tx), Message::read(address, rx)])
    }

    /// Writes `first` and `second` back to back under one address phase.
    pub fn send_then_send(&mut self, address: u16, first: &[u8], second: &[u8]) -> usize {
        self.transfer(&mut [
            Message::write(address, first),
            Message::write(address, second).with_flags(Flags::NO_START),
        ])
    }

    /// Checks whether a device acknowledges `address`.
    ///
    /// Absence is an answer here, not a failure, so the error callback is
    /// not invoked.
    pub fn probe(&mut self, address: u16, flags: Flags) -> bool {
        let outcome = self.run(&mut [Message::write(address, &[]).with_flags(flags)]);
        outcome.serviced == 1
    }

    /// Probes every non-reserved 7-bit address and returns those that answered.
    pub fn scan(&mut self) -> Vec<u16> {
        let found: Vec<u16> = (SCAN_FIRST..=SCAN_LAST)
            .filter(|&address| self.probe(address, Flags::WRITE))
            .collect();

        info!("Scan found {} device(s)", found.len());
        found
    }

    fn run(&mut self, messages: &mut [Message]) -> Outcome {
        let mut locked = BusLock::acquire(&mut *self.pins);
        engine::run(&mut *locked, messages)
    }
}
