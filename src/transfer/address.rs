use crate::bit_layer::{BitLayer, Capabilities, RWBit};

use super::message::{Flags, Message};

/// Address byte for a 7-bit address. Bits above the seventh are dropped.
pub fn seven_bit(address: u16, rw: RWBit) -> u8 {
    ((address << 1) as u8) | rw.bit()
}

/// `11110XX0` prefix carrying the two upper bits of a 10-bit address.
pub fn ten_bit_header(address: u16) -> u8 {
    0xf0 | ((address >> 7) & 0x06) as u8
}

pub fn ten_bit_low(address: u16) -> u8 {
    (address & 0xff) as u8
}

/// Sends an address byte, retrying `retries` times with a stop/start in between.
fn send_with_retries<C>(bus: &mut BitLayer<C>, byte: u8, retries: u8) -> bool
where
    C: Capabilities + ?Sized,
{
    let mut attempt = 0;

    loop {
        if bus.write_byte(byte) {
            return true;
        }
        if attempt == retries {
            debug!("Address byte {:#04x} not acknowledged", byte);
            return false;
        }
        attempt += 1;

        debug!("Retrying address byte {:#04x} ({}/{})", byte, attempt, retries);
        bus.stop();
        let unit = bus.unit();
        bus.delay_us(unit);
        bus.start();
    }
}

/// Runs the address phase of `msg`.
///
/// Returns false if a byte went unacknowledged and the message does not
/// carry `IGNORE_NACK`.
pub fn send_address<C>(bus: &mut BitLayer<C>, msg: &Message) -> bool
where
    C: Capabilities + ?Sized,
{
    let flags = msg.flags();
    let ignore_nack = flags.contains(Flags::IGNORE_NACK);
    let retries = if ignore_nack { 0 } else { 1 };
    let rw = RWBit::from(msg.is_read());

    trace!("Addressing {:#05x} for {} ({:?})", msg.address(), rw, flags);

    if !flags.contains(Flags::ADDR_10BIT) {
        let byte = seven_bit(msg.address(), rw);
        return send_with_retries(bus, byte, retries) || ignore_nack;
    }

    let header = ten_bit_header(msg.address());
    if !send_with_retries(bus, header, retries) && !ignore_nack {
        return false;
    }
    if !bus.write_byte(ten_bit_low(msg.address())) && !ignore_nack {
        debug!("Low address byte of {:#05x} not acknowledged", msg.address());
        return false;
    }

    if rw == RWBit::Read {
        bus.restart();
        if !send_with_retries(bus, header | RWBit::Read.bit(), retries) && !ignore_nack {
            return false;
        }
    }

    true
}
