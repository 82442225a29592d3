use std::ops::{Deref, DerefMut};

use crate::bit_layer::{BitLayer, Capabilities, Error};

use super::address;
use super::message::{Buffer, Flags, Message};

/// Holds the platform lock for as long as it lives.
pub struct BusLock<'a, C>
where
    C: Capabilities + ?Sized,
{
    pins: &'a mut C,
}

impl<'a, C> BusLock<'a, C>
where
    C: Capabilities + ?Sized,
{
    pub fn acquire(pins: &'a mut C) -> Self {
        pins.lock();
        BusLock { pins }
    }
}

impl<'a, C> Deref for BusLock<'a, C>
where
    C: Capabilities + ?Sized,
{
    type Target = C;

    fn deref(&self) -> &C {
        self.pins
    }
}

impl<'a, C> DerefMut for BusLock<'a, C>
where
    C: Capabilities + ?Sized,
{
    fn deref_mut(&mut self) -> &mut C {
        self.pins
    }
}

impl<'a, C> Drop for BusLock<'a, C>
where
    C: Capabilities + ?Sized,
{
    fn drop(&mut self) {
        self.pins.unlock();
    }
}

/// A bus between start and stop. The stop condition is emitted on drop.
struct HeldBus<'a, C>
where
    C: Capabilities + ?Sized,
{
    layer: BitLayer<'a, C>,
}

impl<'a, C> HeldBus<'a, C>
where
    C: Capabilities + ?Sized,
{
    fn start(mut layer: BitLayer<'a, C>) -> Self {
        layer.start();
        HeldBus { layer }
    }
}

impl<'a, C> Deref for HeldBus<'a, C>
where
    C: Capabilities + ?Sized,
{
    type Target = BitLayer<'a, C>;

    fn deref(&self) -> &BitLayer<'a, C> {
        &self.layer
    }
}

impl<'a, C> DerefMut for HeldBus<'a, C>
where
    C: Capabilities + ?Sized,
{
    fn deref_mut(&mut self) -> &mut BitLayer<'a, C> {
        &mut self.layer
    }
}

impl<'a, C> Drop for HeldBus<'a, C>
where
    C: Capabilities + ?Sized,
{
    fn drop(&mut self) {
        self.layer.stop();
    }
}

/// Result of one pass over a message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub serviced: usize,
    pub failure: Option<Error>,
}

/// Writes `data`, returning the number of bytes that count as sent.
fn send_bytes<C>(bus: &mut BitLayer<C>, data: &[u8], flags: Flags) -> usize
where
    C: Capabilities + ?Sized,
{
    let ignore_nack = flags.contains(Flags::IGNORE_NACK);
    let mut sent = 0;

    for &byte in data {
        if !bus.write_byte(byte) && !ignore_nack {
            debug!("Data byte {:#04x} not acknowledged after {} bytes", byte, sent);
            break;
        }
        sent += 1;
    }

    sent
}

/// Fills `buf`, acknowledging every byte but the last unless `NO_READ_ACK` is set.
fn recv_bytes<C>(bus: &mut BitLayer<C>, buf: &mut [u8], flags: Flags) -> usize
where
    C: Capabilities + ?Sized,
{
    let len = buf.len();

    for (index, slot) in buf.iter_mut().enumerate() {
        *slot = bus.read_byte();

        if !flags.contains(Flags::NO_READ_ACK) {
            let last = index + 1 == len;
            bus.send_ack(!last);
        }
    }

    len
}

fn service<C>(bus: &mut BitLayer<C>, index: usize, msg: &mut Message) -> Result<(), Error>
where
    C: Capabilities + ?Sized,
{
    let flags = msg.flags();

    if !flags.contains(Flags::NO_START) {
        if index > 0 {
            bus.restart();
        }
        if !address::send_address(bus, msg) {
            return Err(Error::AddressNack {
                message: index,
                address: msg.address(),
            });
        }
    }

    let len = msg.len();
    let done = match *msg.buffer_mut() {
        Buffer::Read(ref mut buf) => recv_bytes(bus, buf, flags),
        Buffer::Write(data) => send_bytes(bus, data, flags),
    };

    if done < len {
        return Err(Error::DataNack {
            message: index,
            written: done,
        });
    }

    Ok(())
}

/// Runs `messages` in order inside one start/stop bracket.
///
/// The loop ends at the first message that is not fully serviced. The stop
/// condition is emitted on every path out of this function.
pub fn run<C>(pins: &mut C, messages: &mut [Message]) -> Outcome
where
    C: Capabilities + ?Sized,
{
    let mut bus = HeldBus::start(BitLayer::new(pins));
    let mut serviced = 0;

    for (index, msg) in messages.iter_mut().enumerate() {
        if let Err(error) = service(&mut *bus, index, msg) {
            return Outcome {
                serviced,
                failure: Some(error),
            };
        }
        serviced += 1;
    }

    Outcome {
        serviced,
        failure: None,
    }
}
