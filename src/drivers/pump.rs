//! Water refill pump driver (logic-level MOSFET, on/off).
//!
//! ## Safety contract
//!
//! The pump must stop once the reservoir reads at or above the refill
//! threshold.  Enforced by the sensor tick; this driver is a dumb actuator.
//!
//! ## Dual-target design
//!
//! Generic over an `embedded-hal` output pin.  Only level changes touch
//! the pin, so the sensor tick may command the same state every sample.

use embedded_hal::digital::OutputPin;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Stopped,
    Running,
}

pub struct WaterPump<P> {
    pin: P,
    state: PumpState,
    switch_count: u32,
}

impl<P: OutputPin> WaterPump<P> {
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self {
            pin,
            state: PumpState::Stopped,
            switch_count: 0,
        }
    }

    pub fn set(&mut self, on: bool) {
        let target = if on { PumpState::Running } else { PumpState::Stopped };
        if target == self.state {
            return;
        }
        let _ = if on { self.pin.set_high() } else { self.pin.set_low() };
        self.state = target;
        self.switch_count = self.switch_count.wrapping_add(1);
        debug!("Pump: {:?}", target);
    }

    pub fn stop(&mut self) {
        self.set(false);
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PumpState::Running
    }

    /// Number of on/off transitions since boot.
    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }
}
