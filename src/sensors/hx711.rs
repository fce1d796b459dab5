//! HX711 24-bit load-cell ADC, channel A at gain 128.
//!
//! Bit-banged over two pins: DOUT (input, LOW when a conversion is ready)
//! and SCK (output).  A read clocks 24 data bits MSB first, then one extra
//! pulse that selects channel A / gain 128 for the next conversion.
//!
//! Generic over `embedded-hal` pins and delay so the host tests can drive
//! it with mock pins.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::SensorError;

/// Poll interval while waiting for DOUT to fall.
const READY_POLL_US: u32 = 5;
/// SCK half-period.
const CLOCK_HALF_PERIOD_US: u32 = 1;
/// Data bits per conversion.
const DATA_BITS: u32 = 24;

pub struct Hx711<DOUT, SCK, D> {
    dout: DOUT,
    sck: SCK,
    delay: D,
    /// Counts per gram.  Always positive.
    scale: f32,
    /// Raw reading at zero load.
    offset: i32,
}

impl<DOUT, SCK, D> Hx711<DOUT, SCK, D>
where
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    pub fn new(dout: DOUT, mut sck: SCK, delay: D) -> Self {
        // SCK held high for >60 us powers the chip down.
        let _ = sck.set_low();
        Self {
            dout,
            sck,
            delay,
            scale: 1.0,
            offset: 0,
        }
    }

    /// Conversion ready right now.
    pub fn is_ready(&mut self) -> bool {
        self.dout.is_low().unwrap_or(false)
    }

    /// Wait up to `timeout` for a conversion, then shift it out.
    pub fn read_raw(&mut self, timeout: Duration) -> Result<i32, SensorError> {
        self.wait_ready(timeout)?;

        let mut value: u32 = 0;
        for _ in 0..DATA_BITS {
            self.sck.set_high().map_err(|_| SensorError::Bus)?;
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);
            let bit = self.dout.is_high().map_err(|_| SensorError::Bus)?;
            value = (value << 1) | u32::from(bit);
            self.sck.set_low().map_err(|_| SensorError::Bus)?;
            self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        }

        // Gain 128 select pulse.
        self.sck.set_high().map_err(|_| SensorError::Bus)?;
        self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        self.sck.set_low().map_err(|_| SensorError::Bus)?;
        self.delay.delay_us(CLOCK_HALF_PERIOD_US);

        Ok(sign_extend_24(value))
    }

    /// Calibrated mass in grams.
    pub fn read_mass(&mut self, timeout: Duration) -> Result<f32, SensorError> {
        let raw = self.read_raw(timeout)?;
        Ok(self.to_grams(raw))
    }

    pub fn to_grams(&self, raw: i32) -> f32 {
        (i64::from(raw) - i64::from(self.offset)) as f32 / self.scale
    }

    /// Non-positive or non-finite factors are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset;
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    fn wait_ready(&mut self, timeout: Duration) -> Result<(), SensorError> {
        let budget_us = timeout.as_micros();
        let mut waited_us: u64 = 0;
        while !self.is_ready() {
            if waited_us >= budget_us {
                return Err(SensorError::NotReady);
            }
            self.delay.delay_us(READY_POLL_US);
            waited_us += u64::from(READY_POLL_US);
        }
        Ok(())
    }
}

/// Two's-complement sign extension of a 24-bit sample.
pub const fn sign_extend_24(value: u32) -> i32 {
    ((value << 8) as i32) >> 8
}
