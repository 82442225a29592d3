use std::convert;
use std::fmt;

impl fmt::Display for RWBit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RWBit::Read => f.write_str("Read"),
            RWBit::Write => f.write_str("Write"),
        }
    }
}

/// Direction bit carried in the lowest bit of an address byte, seen from the master.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RWBit {
    Write,
    Read,
}

impl RWBit {
    pub fn bit(self) -> u8 {
        match self {
            RWBit::Write => 0,
            RWBit::Read => 1,
        }
    }
}

impl convert::From<bool> for RWBit {
    fn from(read: bool) -> Self {
        if read {
            RWBit::Read
        } else {
            RWBit::Write
        }
    }
}

impl convert::From<u8> for RWBit {
    fn from(address_byte: u8) -> Self {
        RWBit::from(address_byte & 1 == 1)
    }
}
