//! Sensor subsystem — load-cell drivers and the aggregating [`ScaleHub`].
//!
//! The hub owns one converter per [`ScaleChannel`] and routes port calls to
//! the right one.

pub mod hx711;

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ScaleChannel, SensorError};
use hx711::Hx711;

/// One calibrated load cell.
pub trait LoadCell {
    fn is_ready(&mut self) -> bool;
    fn read_raw(&mut self, timeout: Duration) -> Result<i32, SensorError>;
    fn read_mass(&mut self, timeout: Duration) -> Result<f32, SensorError>;
    fn set_scale(&mut self, scale: f32);
    fn set_offset(&mut self, offset: i32);
}

impl<DOUT, SCK, D> LoadCell for Hx711<DOUT, SCK, D>
where
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    fn is_ready(&mut self) -> bool {
        Hx711::is_ready(self)
    }

    fn read_raw(&mut self, timeout: Duration) -> Result<i32, SensorError> {
        Hx711::read_raw(self, timeout)
    }

    fn read_mass(&mut self, timeout: Duration) -> Result<f32, SensorError> {
        Hx711::read_mass(self, timeout)
    }

    fn set_scale(&mut self, scale: f32) {
        Hx711::set_scale(self, scale);
    }

    fn set_offset(&mut self, offset: i32) {
        Hx711::set_offset(self, offset);
    }
}

/// Bowl and reservoir cells.
pub struct ScaleHub<F, W> {
    pub food: F,
    pub water: W,
}

impl<F: LoadCell, W: LoadCell> ScaleHub<F, W> {
    /// Pass in pre-built drivers (built in main where peripheral
    /// ownership is established).
    pub fn new(food: F, water: W) -> Self {
        Self { food, water }
    }

    /// Borrow the cell behind `channel`.
    pub fn cell(&mut self, channel: ScaleChannel) -> &mut dyn LoadCell {
        match channel {
            ScaleChannel::Food => &mut self.food,
            ScaleChannel::Water => &mut self.water,
        }
    }
}
