use super::Capabilities;

/// Bus conditions and byte shifting on top of a [`Capabilities`] set.
///
/// Every timing value is derived from the delay unit read once at
/// construction: a full unit per SCL period and half a unit (rounded up)
/// for each clock phase.
pub struct BitLayer<'a, C>
where
    C: Capabilities + ?Sized,
{
    pins: &'a mut C,
    unit: u16,
    half: u16,
}

impl<'a, C> BitLayer<'a, C>
where
    C: Capabilities + ?Sized,
{
    pub fn new(pins: &'a mut C) -> Self {
        let unit = pins.bit_delay_us();

        BitLayer {
            pins,
            unit,
            half: unit - unit / 2,
        }
    }

    pub fn unit(&self) -> u16 {
        self.unit
    }

    pub fn half(&self) -> u16 {
        self.half
    }

    pub fn delay_us(&mut self, us: u16) {
        self.pins.delay_us(us);
    }

    /// Pulls SDA low while SCL is high, then takes the clock low.
    pub fn start(&mut self) {
        trace!("Start");
        self.pins.sda_output();
        self.pins.set_sda(false);
        self.pins.delay_us(self.half);
        self.pins.set_scl(false);
    }

    /// Start condition issued while the bus is already held.
    pub fn restart(&mut self) {
        trace!("Restart");
        self.pins.sda_output();
        self.pins.set_sda(true);
        self.pins.set_scl(true);
        self.pins.delay_us(self.half);
        self.pins.set_sda(false);
        self.pins.delay_us(self.half);
        self.pins.set_scl(false);
    }

    /// Releases SDA while SCL is high and waits a full unit of bus-free time.
    pub fn stop(&mut self) {
        trace!("Stop");
        self.pins.sda_output();
        self.pins.set_sda(false);
        self.pins.delay_us(self.half);
        self.pins.set_scl(true);
        self.pins.delay_us(self.half);
        self.pins.set_sda(true);
        self.pins.delay_us(self.unit);
    }

    /// Clocks the ninth bit and returns true if the slave pulled SDA low.
    pub fn wait_ack(&mut self) -> bool {
        self.pins.sda_input();
        self.pins.set_sda(true);
        self.pins.delay_us(self.half);
        self.pins.set_scl(true);
        let ack = !self.pins.sda();
        self.pins.set_scl(false);

        ack
    }

    /// Shifts `byte` out MSB first and returns whether it was acknowledged.
    pub fn write_byte(&mut self, byte: u8) -> bool {
        self.pins.sda_output();

        for index in (0..8).rev() {
            self.pins.set_scl(false);
            self.pins.set_sda((byte >> index) & 1 == 1);
            self.pins.delay_us(self.half);
            self.pins.set_scl(true);
            self.pins.delay_us(self.half);
        }
        self.pins.set_scl(false);
        self.pins.delay_us(self.half);

        self.wait_ack()
    }

    /// Shifts one byte in MSB first. The ninth clock is left to the caller.
    pub fn read_byte(&mut self) -> u8 {
        let mut byte = 0u8;

        self.pins.sda_input();
        self.pins.set_sda(true);
        self.pins.delay_us(self.half);

        for _ in 0..8 {
            byte <<= 1;
            self.pins.set_scl(true);
            if self.pins.sda() {
                byte |= 1;
            }
            self.pins.set_scl(false);
            self.pins.delay_us(self.unit);
        }

        byte
    }

    /// Clocks the ninth bit of a read: SDA low for ack, released for nack.
    pub fn send_ack(&mut self, ack: bool) {
        self.pins.sda_output();

        if ack {
            self.pins.set_sda(false);
        }
        self.pins.delay_us(self.half);
        self.pins.set_scl(true);
        self.pins.set_scl(false);
    }

    /// Bus clear: nine clock pulses with SDA released, then a stop.
    ///
    /// A slave that lost track of the clock in the middle of a read keeps
    /// SDA low until it has shifted out its remaining bits.
    pub fn clear(&mut self) {
        debug!("Clearing bus");
        self.pins.sda_input();
        self.pins.set_sda(true);

        for _ in 0..9 {
            self.pins.set_scl(false);
            self.pins.delay_us(self.half);
            self.pins.set_scl(true);
            self.pins.delay_us(self.half);
        }
        self.pins.set_scl(false);
        self.stop();
    }
}
