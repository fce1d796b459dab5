//! Millisecond tick adapter.
//!
//! Implements [`MonotonicClock`] for the feeder.
//!
//! - **`target_os = "espidf"`** — reads the tick base advanced by the
//!   1 kHz [`hw_timer`](crate::drivers::hw_timer) callback.
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side testing and simulation.

use crate::app::ports::MonotonicClock;

pub struct TickClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl MonotonicClock for TickClock {
    /// Milliseconds since boot, wrapping.
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u32 {
        crate::events::millis()
    }

    /// Milliseconds since construction, wrapping.
    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
