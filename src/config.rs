//! System configuration parameters
//!
//! All tunable parameters for the PetFeeder controller.  Defaults match the
//! production mechanics (28BYJ-48 + ULN2003 auger, two HX711 load cells).

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Core feeder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeederConfig {
    // --- Loop cadence ---
    /// Actuation tick period (milliseconds)
    pub fast_tick_ms: u32,
    /// Sensor sampling tick period (milliseconds)
    pub sensor_tick_ms: u32,
    /// Schedule evaluation tick period (milliseconds)
    pub schedule_tick_ms: u32,

    // --- Dispenser ---
    /// Minimum spacing between two stepper pulses
    pub step_delay_ms: u32,
    /// Slack added on top of the nominal dispense duration before the task is forced to finish
    pub deadline_margin_ms: u32,
    /// Any task claiming more steps than this is treated as corrupted
    pub max_feed_steps: u32,
    /// Auger rotation per amount class (degrees): Low, Mid, High
    pub feed_degrees: [u32; 3],
    /// Nominal portion per amount class (grams): Low, Mid, High
    pub feed_grams: [u16; 3],

    // --- Load cells ---
    /// Bounded wait for TARE / CAL raw reads
    pub sensor_timeout_ms: u32,
    /// Bounded wait for periodic sampling reads
    pub sample_timeout_ms: u32,
    /// Water reservoir refill threshold (grams); pump runs below this
    pub water_refill_threshold_g: i32,
    /// Minimum bowl decrease recognised as the pet eating (grams)
    pub eat_detect_min_g: i32,

    // --- Time sync ---
    /// Interval between GETTIME requests while a resync is pending
    pub resync_interval_ms: u32,

    // --- Persistence ---
    /// Storage initialisation attempts at boot
    pub storage_init_attempts: u8,
    /// Backoff between storage initialisation attempts
    pub storage_init_backoff_ms: u32,

    // --- Link ---
    /// Companion UART baud rate
    pub uart_baud: u32,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            // Loop cadence
            fast_tick_ms: 10,       // 100 Hz
            sensor_tick_ms: 100,    // 10 Hz
            schedule_tick_ms: 1000, // 1 Hz

            // Dispenser
            step_delay_ms: 10,
            deadline_margin_ms: 1000,
            max_feed_steps: 4096 * 2,
            feed_degrees: [30, 60, 120],
            feed_grams: [10, 25, 40],

            // Load cells
            sensor_timeout_ms: 500,
            sample_timeout_ms: 100,
            water_refill_threshold_g: 80,
            eat_detect_min_g: 3,

            // Time sync
            resync_interval_ms: 60_000, // 1/min

            // Persistence
            storage_init_attempts: 3,
            storage_init_backoff_ms: 10,

            // Link
            uart_baud: 115_200,
        }
    }
}

/// Errors from [`FeederConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl FeederConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_tick_ms == 0
            || self.fast_tick_ms >= self.sensor_tick_ms
            || self.sensor_tick_ms >= self.schedule_tick_ms
        {
            return Err(ConfigError::ValidationFailed(
                "tick periods must satisfy 0 < fast < sensor < schedule",
            ));
        }
        if !(1..=1000).contains(&self.step_delay_ms) {
            return Err(ConfigError::ValidationFailed("step_delay_ms must be 1–1000"));
        }
        if self.max_feed_steps == 0 {
            return Err(ConfigError::ValidationFailed("max_feed_steps must be > 0"));
        }
        if self.feed_degrees.iter().any(|&d| d == 0 || d > 360) {
            return Err(ConfigError::ValidationFailed("feed_degrees must be 1–360"));
        }
        if self.feed_grams.iter().any(|&g| g == 0) {
            return Err(ConfigError::ValidationFailed("feed_grams must be > 0"));
        }
        if self.sensor_timeout_ms == 0 || self.sample_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("sensor timeouts must be > 0"));
        }
        if self.eat_detect_min_g <= 0 {
            return Err(ConfigError::ValidationFailed("eat_detect_min_g must be > 0"));
        }
        if self.resync_interval_ms < self.schedule_tick_ms {
            return Err(ConfigError::ValidationFailed(
                "resync_interval_ms must be >= schedule_tick_ms",
            ));
        }
        if self.storage_init_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "storage_init_attempts must be >= 1",
            ));
        }
        Ok(())
    }

    pub fn fast_tick(&self) -> Duration {
        Duration::from_millis(u64::from(self.fast_tick_ms))
    }

    pub fn sensor_tick(&self) -> Duration {
        Duration::from_millis(u64::from(self.sensor_tick_ms))
    }

    pub fn schedule_tick(&self) -> Duration {
        Duration::from_millis(u64::from(self.schedule_tick_ms))
    }

    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.sensor_timeout_ms))
    }

    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.sample_timeout_ms))
    }

    pub fn storage_init_backoff(&self) -> Duration {
        Duration::from_millis(u64::from(self.storage_init_backoff_ms))
    }
}
