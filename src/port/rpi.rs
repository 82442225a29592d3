//! Raspberry Pi binding through `rppal` GPIO.
//!
//! Both lines are driven open-drain style: writing a one releases the pin
//! (switched to input, the bus pull-up raises it), writing a zero drives it
//! low as an output. Clock stretching is not detected.

use rppal::gpio::{Gpio, IoPin, Mode};

use super::spin_delay_us;
use crate::bit_layer::{BitLayer, Capabilities, Error};

pub struct RpiBus {
    sda: IoPin,
    scl: IoPin,
    bit_delay_us: u16,
    last_error: Option<Error>,
}

impl RpiBus {
    /// Claims the two BCM pins and leaves the bus idle (both lines released).
    pub fn new(sda_pin: u8, scl_pin: u8, bit_delay_us: u16) -> Result<Self, Error> {
        let gpio = Gpio::new()?;

        let mut bus = RpiBus {
            sda: gpio.get(sda_pin)?.into_io(Mode::Input),
            scl: gpio.get(scl_pin)?.into_io(Mode::Input),
            bit_delay_us,
            last_error: None,
        };
        write(&mut bus.sda, true);
        write(&mut bus.scl, true);

        info!(
            "Bus on sda {} / scl {} with {} us delay unit",
            sda_pin, scl_pin, bit_delay_us
        );
        Ok(bus)
    }

    /// The cause of the last failed transaction, if any, clearing it.
    pub fn take_error(&mut self) -> Option<Error> {
        self.last_error.take()
    }
}

fn write(pin: &mut IoPin, high: bool) {
    if high {
        pin.set_mode(Mode::Input);
    } else {
        pin.set_low();
        pin.set_mode(Mode::Output);
    }
}

impl Capabilities for RpiBus {
    fn set_sda(&mut self, high: bool) {
        write(&mut self.sda, high);
    }

    fn set_scl(&mut self, high: bool) {
        write(&mut self.scl, high);
    }

    fn sda(&mut self) -> bool {
        self.sda.is_high()
    }

    fn delay_us(&mut self, us: u16) {
        spin_delay_us(us);
    }

    fn bit_delay_us(&self) -> u16 {
        self.bit_delay_us
    }

    fn on_error(&mut self, error: Error) {
        error!("Transfer failed: {}", error);
        BitLayer::new(self).clear();
        self.last_error = Some(error);
    }
}
