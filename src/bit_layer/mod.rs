mod error;
mod bit_layer;
mod rw_bit;

pub use self::error::Error;
pub use self::rw_bit::RWBit;
pub use self::bit_layer::BitLayer;

/// The primitives a platform hands to the bus driver.
///
/// The driver never touches hardware itself; every edge on SDA and SCL and
/// every wait goes through an implementation of this trait. One instance
/// represents one physical bus and is owned by the caller for as long as
/// the driver is used.
pub trait Capabilities {
    /// Drives the data line. Only meaningful while SDA is an output, except
    /// that releasing it (`true`) before sampling enables the pull-up on
    /// platforms that need it.
    fn set_sda(&mut self, high: bool);

    /// Drives the clock line.
    fn set_scl(&mut self, high: bool);

    /// Samples the data line. Only valid while SDA is an input.
    fn sda(&mut self) -> bool;

    /// Switches SDA to output. Needed only on boards without a passive pull-up.
    fn sda_output(&mut self) {}

    /// Switches SDA to input. Needed only on boards without a passive pull-up.
    fn sda_input(&mut self) {}

    /// Busy-waits at least `us` microseconds.
    fn delay_us(&mut self, us: u16);

    /// Takes the bus lock. A no-op is fine on single threaded targets.
    fn lock(&mut self) {}

    /// Releases the bus lock taken by [`Capabilities::lock`].
    fn unlock(&mut self) {}

    /// Delay unit in microseconds; governs the bus speed.
    fn bit_delay_us(&self) -> u16;

    /// Signals a failed transaction to the upper layer
    fn on_error(&mut self, _error: Error) {}
}
