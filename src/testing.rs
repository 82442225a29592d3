//! Wire-level virtual slave used by the unit tests.
//!
//! `VirtualBus` implements [`Capabilities`] and models an open-drain bus
//! with one slave attached. The slave follows the clock edges the master
//! produces, decodes start, repeated start and stop conditions, answers
//! address and data bytes with ACK or NACK and shifts out read data.

use std::collections::VecDeque;

use crate::bit_layer::{Capabilities, Error, RWBit};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    Lock,
    Unlock,
    Start,
    Restart,
    Stop,
    /// A byte clocked out by the master and the slave's answer.
    Written { byte: u8, acked: bool },
    /// A byte shifted out by the slave and the master's answer.
    Read { byte: u8, acked: bool },
    /// The error callback fired.
    Error,
}

#[derive(Copy, Clone, Debug)]
enum Responder {
    Device { address: u16, ten_bit: bool },
    /// Acknowledges every byte it is sent.
    Listener,
    /// Nothing attached; every byte is left unacknowledged.
    Absent,
}

#[derive(Clone, Debug)]
pub struct SlaveConfig {
    responder: Responder,
    address_nacks: usize,
    data_acks: Option<usize>,
    refuse_reads: bool,
    read_data: VecDeque<u8>,
}

impl SlaveConfig {
    pub fn seven_bit(address: u16) -> Self {
        Self::with_responder(Responder::Device {
            address,
            ten_bit: false,
        })
    }

    pub fn ten_bit(address: u16) -> Self {
        Self::with_responder(Responder::Device {
            address,
            ten_bit: true,
        })
    }

    pub fn listener() -> Self {
        Self::with_responder(Responder::Listener)
    }

    pub fn absent() -> Self {
        Self::with_responder(Responder::Absent)
    }

    fn with_responder(responder: Responder) -> Self {
        SlaveConfig {
            responder,
            address_nacks: 0,
            data_acks: None,
            refuse_reads: false,
            read_data: VecDeque::new(),
        }
    }

    /// Bytes returned to master reads; `0xff` once exhausted.
    pub fn with_read_data(mut self, data: &[u8]) -> Self {
        self.read_data.extend(data);
        self
    }

    /// Leaves the first `times` matching address bytes unacknowledged.
    pub fn nacking_address(mut self, times: usize) -> Self {
        self.address_nacks = times;
        self
    }

    /// Acknowledges `count` data bytes, then refuses the rest.
    pub fn nacking_data_after(mut self, count: usize) -> Self {
        self.data_acks = Some(count);
        self
    }

    /// Leaves every read address byte unacknowledged.
    pub fn refusing_reads(mut self) -> Self {
        self.refuse_reads = true;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Next {
    Receive,
    Transmit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Expect {
    Address,
    TenBitLow,
    Data,
    /// Not addressed; bytes are still decoded but never acknowledged.
    Ignore,
}

#[derive(Copy, Clone, Debug)]
enum Phase {
    Idle,
    Receive { value: u8, bits: u8 },
    AckOut { ack: bool, next: Next, driving: bool },
    Transmit { byte: u8, sent: u8 },
    AckIn { byte: u8 },
    AckInDone { more: bool },
}

pub struct VirtualBus {
    config: SlaveConfig,
    bit_delay: u16,
    scl: bool,
    master_sda: bool,
    slave_sda: bool,
    sda_output: bool,
    busy: bool,
    phase: Phase,
    expect: Expect,
    ten_bit_selected: bool,
    locked: bool,
    received: Vec<u8>,
    events: Vec<BusEvent>,
    delays: Vec<u16>,
    errors: Vec<Error>,
    clock_pulses: usize,
}

impl VirtualBus {
    pub fn new(config: SlaveConfig) -> Self {
        VirtualBus {
            config,
            bit_delay: 1,
            scl: true,
            master_sda: true,
            slave_sda: true,
            sda_output: true,
            busy: false,
            phase: Phase::Idle,
            expect: Expect::Address,
            ten_bit_selected: false,
            locked: false,
            received: Vec::new(),
            events: Vec::new(),
            delays: Vec::new(),
            errors: Vec::new(),
            clock_pulses: 0,
        }
    }

    pub fn with_bit_delay(mut self, us: u16) -> Self {
        self.bit_delay = us;
        self
    }

    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Bus conditions and bytes only, without lock or callback bookkeeping.
    pub fn wire(&self) -> Vec<BusEvent> {
        self.events
            .iter()
            .copied()
            .filter(|event| {
                !matches!(event, BusEvent::Lock | BusEvent::Unlock | BusEvent::Error)
            })
            .collect()
    }

    pub fn count(&self, event: BusEvent) -> usize {
        self.events.iter().filter(|&&e| e == event).count()
    }

    /// Data bytes the slave accepted after being addressed.
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    pub fn delays(&self) -> &[u16] {
        &self.delays
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_idle(&self) -> bool {
        !self.busy && self.scl && self.line()
    }

    pub fn clock_pulses(&self) -> usize {
        self.clock_pulses
    }

    fn line(&self) -> bool {
        self.master_sda && self.slave_sda
    }

    fn on_start(&mut self) {
        self.events.push(if self.busy {
            BusEvent::Restart
        } else {
            BusEvent::Start
        });
        self.busy = true;
        self.slave_sda = true;
        self.expect = Expect::Address;
        self.phase = Phase::Receive { value: 0, bits: 0 };
    }

    fn on_stop(&mut self) {
        self.events.push(BusEvent::Stop);
        self.busy = false;
        self.slave_sda = true;
        self.ten_bit_selected = false;
        self.expect = Expect::Address;
        self.phase = Phase::Idle;
    }

    fn on_scl_rise(&mut self) {
        self.clock_pulses += 1;

        match self.phase {
            Phase::Receive { value, bits } => {
                let value = (value << 1) | self.line() as u8;
                if bits + 1 < 8 {
                    self.phase = Phase::Receive {
                        value,
                        bits: bits + 1,
                    };
                } else {
                    let (ack, next) = self.accept(value);
                    self.events.push(BusEvent::Written { byte: value, acked: ack });
                    self.phase = Phase::AckOut {
                        ack,
                        next,
                        driving: false,
                    };
                }
            }
            Phase::AckIn { byte } => {
                let acked = !self.line();
                self.events.push(BusEvent::Read { byte, acked });
                self.phase = Phase::AckInDone { more: acked };
            }
            _ => {}
        }
    }

    fn on_scl_fall(&mut self) {
        match self.phase {
            Phase::AckOut { ack, next, driving: false } => {
                self.slave_sda = !ack;
                self.phase = Phase::AckOut {
                    ack,
                    next,
                    driving: true,
                };
            }
            Phase::AckOut { ack, next, driving: true } => {
                self.slave_sda = true;
                self.phase = match (ack, next) {
                    (false, _) | (true, Next::Receive) => Phase::Receive { value: 0, bits: 0 },
                    (true, Next::Transmit) => self.present_next_byte(),
                };
            }
            Phase::Transmit { byte, sent } => {
                if sent == 8 {
                    self.slave_sda = true;
                    self.phase = Phase::AckIn { byte };
                } else {
                    self.slave_sda = (byte >> (7 - sent)) & 1 == 1;
                    self.phase = Phase::Transmit {
                        byte,
                        sent: sent + 1,
                    };
                }
            }
            Phase::AckInDone { more: true } => self.phase = self.present_next_byte(),
            Phase::AckInDone { more: false } => {
                self.slave_sda = true;
                self.phase = Phase::Idle;
            }
            _ => {}
        }
    }

    fn present_next_byte(&mut self) -> Phase {
        let byte = self.config.read_data.pop_front().unwrap_or(0xff);
        self.slave_sda = byte & 0x80 != 0;
        Phase::Transmit { byte, sent: 1 }
    }

    fn accept(&mut self, byte: u8) -> (bool, Next) {
        let (address, ten_bit) = match self.config.responder {
            Responder::Listener => return (true, Next::Receive),
            Responder::Absent => return (false, Next::Receive),
            Responder::Device { address, ten_bit } => (address, ten_bit),
        };

        match self.expect {
            Expect::Address => {
                let rw = RWBit::from(byte);
                let hit = if ten_bit {
                    byte & 0xf8 == 0xf0
                        && u16::from((byte >> 1) & 0x03) == (address >> 8) & 0x03
                        && (rw == RWBit::Write || self.ten_bit_selected)
                } else {
                    u16::from(byte >> 1) == address
                };

                if !hit {
                    self.expect = Expect::Ignore;
                    return (false, Next::Receive);
                }
                if self.config.address_nacks > 0 {
                    self.config.address_nacks -= 1;
                    self.expect = Expect::Ignore;
                    return (false, Next::Receive);
                }
                if rw == RWBit::Read && self.config.refuse_reads {
                    self.expect = Expect::Ignore;
                    return (false, Next::Receive);
                }

                match rw {
                    RWBit::Read => (true, Next::Transmit),
                    RWBit::Write if ten_bit => {
                        self.expect = Expect::TenBitLow;
                        (true, Next::Receive)
                    }
                    RWBit::Write => {
                        self.expect = Expect::Data;
                        (true, Next::Receive)
                    }
                }
            }
            Expect::TenBitLow => {
                if u16::from(byte) == address & 0xff {
                    self.ten_bit_selected = true;
                    self.expect = Expect::Data;
                    (true, Next::Receive)
                } else {
                    self.expect = Expect::Ignore;
                    (false, Next::Receive)
                }
            }
            Expect::Ignore => (false, Next::Receive),
            Expect::Data => {
                let ack = match self.config.data_acks.as_mut() {
                    None => true,
                    Some(0) => false,
                    Some(left) => {
                        *left -= 1;
                        true
                    }
                };
                if ack {
                    self.received.push(byte);
                }
                (ack, Next::Receive)
            }
        }
    }
}

impl Capabilities for VirtualBus {
    fn set_sda(&mut self, high: bool) {
        let before = self.line();
        self.master_sda = high;
        let after = self.line();

        if self.scl && before != after {
            if after {
                self.on_stop();
            } else {
                self.on_start();
            }
        }
    }

    fn set_scl(&mut self, high: bool) {
        if self.scl == high {
            return;
        }
        self.scl = high;

        if high {
            self.on_scl_rise();
        } else {
            self.on_scl_fall();
        }
    }

    fn sda(&mut self) -> bool {
        assert!(!self.sda_output, "SDA sampled while driven as an output");
        self.line()
    }

    fn sda_output(&mut self) {
        self.sda_output = true;
    }

    fn sda_input(&mut self) {
        self.sda_output = false;
    }

    fn delay_us(&mut self, us: u16) {
        self.delays.push(us);
    }

    fn lock(&mut self) {
        assert!(!self.locked, "bus locked twice");
        self.locked = true;
        self.events.push(BusEvent::Lock);
    }

    fn unlock(&mut self) {
        assert!(self.locked, "bus unlocked without lock");
        self.locked = false;
        self.events.push(BusEvent::Unlock);
    }

    fn bit_delay_us(&self) -> u16 {
        self.bit_delay
    }

    fn on_error(&mut self, error: Error) {
        self.events.push(BusEvent::Error);
        self.errors.push(error);
    }
}
