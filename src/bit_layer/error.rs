use std::{convert, error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The slave did not acknowledge the address phase of message `message`.
    AddressNack { message: usize, address: u16 },
    /// The slave stopped acknowledging after `written` bytes of message `message`.
    DataNack { message: usize, written: usize },
    Generic(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::AddressNack { message, address } => write!(
                f,
                "Address {:#05x} not acknowledged (message {})",
                address, message
            ),
            Error::DataNack { message, written } => write!(
                f,
                "Data not acknowledged after {} bytes (message {})",
                written, message
            ),
            Error::Generic(ref descr) => f.write_str(descr),
        }
    }
}

#[cfg(feature = "rpi")]
impl convert::From<rppal::gpio::Error> for Error {
    fn from(prev: rppal::gpio::Error) -> Self {
        Error::Generic(format!("PinError: {}", prev))
    }
}

impl convert::From<log::SetLoggerError> for Error {
    fn from(prev: log::SetLoggerError) -> Self {
        Error::Generic(format!("LoggerError: {}", prev))
    }
}
