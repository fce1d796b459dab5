//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`ScaleHub`] and all actuator drivers, exposing them
//! through [`ScalePort`] and [`ActuatorPort`].  This is the only
//! module in the system that touches actual hardware.  Pin types are
//! generic, so host builds can plug in simulated pins.

use embassy_time::Duration;
use embedded_hal::digital::OutputPin;

use crate::app::ports::{ActuatorPort, ScaleChannel, ScalePort, SensorError, StepDirection};
use crate::drivers::pump::WaterPump;
use crate::drivers::stepper::{HALF_STEPS_PER_REV, Uln2003};
use crate::sensors::{LoadCell, ScaleHub};

/// Concrete adapter that combines all hardware behind port traits.
pub struct FeederHardware<F, W, S, P> {
    scales: ScaleHub<F, W>,
    stepper: Uln2003<S>,
    pump: WaterPump<P>,
}

impl<F, W, S, P> FeederHardware<F, W, S, P>
where
    F: LoadCell,
    W: LoadCell,
    S: OutputPin,
    P: OutputPin,
{
    pub fn new(scales: ScaleHub<F, W>, stepper: Uln2003<S>, pump: WaterPump<P>) -> Self {
        Self {
            scales,
            stepper,
            pump,
        }
    }

    pub fn stepper_mut(&mut self) -> &mut Uln2003<S> {
        &mut self.stepper
    }

    pub fn pump(&self) -> &WaterPump<P> {
        &self.pump
    }
}

// ── ScalePort implementation ──────────────────────────────────

impl<F, W, S, P> ScalePort for FeederHardware<F, W, S, P>
where
    F: LoadCell,
    W: LoadCell,
    S: OutputPin,
    P: OutputPin,
{
    fn data_ready(&mut self, channel: ScaleChannel) -> bool {
        self.scales.cell(channel).is_ready()
    }

    fn read_raw(&mut self, channel: ScaleChannel, timeout: Duration) -> Result<i32, SensorError> {
        self.scales.cell(channel).read_raw(timeout)
    }

    fn read_mass(&mut self, channel: ScaleChannel, timeout: Duration) -> Result<f32, SensorError> {
        self.scales.cell(channel).read_mass(timeout)
    }

    fn set_scale(&mut self, channel: ScaleChannel, scale: f32) {
        self.scales.cell(channel).set_scale(scale);
    }

    fn set_offset(&mut self, channel: ScaleChannel, offset: i32) {
        self.scales.cell(channel).set_offset(offset);
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<F, W, S, P> ActuatorPort for FeederHardware<F, W, S, P>
where
    F: LoadCell,
    W: LoadCell,
    S: OutputPin,
    P: OutputPin,
{
    fn step(&mut self, direction: StepDirection) {
        self.stepper.step(direction);
    }

    fn all_off(&mut self) {
        self.stepper.release();
    }

    fn steps_per_revolution(&self) -> u32 {
        HALF_STEPS_PER_REV
    }

    fn set_water_pump(&mut self, on: bool) {
        self.pump.set(on);
    }
}
