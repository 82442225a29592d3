//! Platform bindings for [`Capabilities`](crate::Capabilities).

use std::hint;
use std::time::{Duration, Instant};

#[cfg(feature = "rpi")]
pub mod rpi;

#[cfg(feature = "rpi")]
pub use self::rpi::RpiBus;

/// Spins on the monotonic clock for at least `us` microseconds.
pub fn spin_delay_us(us: u16) {
    let deadline = Instant::now() + Duration::from_micros(u64::from(us));

    while Instant::now() < deadline {
        hint::spin_loop();
    }
}
