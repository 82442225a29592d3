use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Per-message flag bits. Positions are part of the public contract.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Flags(u16);

impl Flags {
    pub const WRITE: Flags = Flags(0x0000);
    pub const READ: Flags = Flags(1 << 0);
    /// The address is ten bits wide.
    pub const ADDR_10BIT: Flags = Flags(1 << 2);
    /// Skip the address phase and continue the previous message.
    pub const NO_START: Flags = Flags(1 << 4);
    /// Carry on when the slave does not acknowledge.
    pub const IGNORE_NACK: Flags = Flags(1 << 5);
    /// Do not clock an ACK/NACK after received bytes.
    pub const NO_READ_ACK: Flags = Flags(1 << 6);

    const NAMES: [(Flags, &'static str); 5] = [
        (Flags::READ, "READ"),
        (Flags::ADDR_10BIT, "ADDR_10BIT"),
        (Flags::NO_START, "NO_START"),
        (Flags::IGNORE_NACK, "IGNORE_NACK"),
        (Flags::NO_READ_ACK, "NO_READ_ACK"),
    ];

    pub const fn from_bits(bits: u16) -> Self {
        Flags(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn without(self, other: Flags) -> Self {
        Flags(self.0 & !other.0)
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = Flags::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .peekable();

        if names.peek().is_none() {
            return f.write_str("WRITE");
        }
        for (index, name) in names.enumerate() {
            if index > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

/// Data of one message. The variant decides the transfer direction.
#[derive(Debug)]
pub enum Buffer<'a> {
    Write(&'a [u8]),
    Read(&'a mut [u8]),
}

/// One addressed bus operation inside a transaction.
#[derive(Debug)]
pub struct Message<'a> {
    address: u16,
    flags: Flags,
    buffer: Buffer<'a>,
}

impl<'a> Message<'a> {
    pub fn write(address: u16, data: &'a [u8]) -> Self {
        Message {
            address,
            flags: Flags::WRITE,
            buffer: Buffer::Write(data),
        }
    }

    pub fn read(address: u16, buf: &'a mut [u8]) -> Self {
        Message {
            address,
            flags: Flags::READ,
            buffer: Buffer::Read(buf),
        }
    }

    /// Adds `flags` to the message. The direction always follows the buffer,
    /// so a READ bit passed here is ignored for write messages.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags |= flags.without(Flags::READ);
        self
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn is_read(&self) -> bool {
        matches!(self.buffer, Buffer::Read(_))
    }

    pub fn len(&self) -> usize {
        match self.buffer {
            Buffer::Write(data) => data.len(),
            Buffer::Read(ref buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer<'a> {
        &mut self.buffer
    }
}
