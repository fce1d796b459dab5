//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederService (domain)
//! ```
//!
//! Driven adapters (load cells, stepper, storage, serial link, event sinks)
//! implement these traits.  The [`FeederService`](super::service::FeederService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use embassy_time::Duration;

use crate::scheduler::ScheduleEntry;

// ───────────────────────────────────────────────────────────────
// Scale port (driven adapter: load cells → domain)
// ───────────────────────────────────────────────────────────────

/// Which load cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleChannel {
    /// Bowl cell.
    Food,
    /// Reservoir cell.
    Water,
}

impl ScaleChannel {
    /// Parse the wire name used by TARE / CAL.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FOOD" => Some(Self::Food),
            "WATER" => Some(Self::Water),
            _ => None,
        }
    }
}

/// Read-side port: the domain calls this to sample the load cells.
///
/// Reads may wait, but never longer than the `timeout` passed in.
pub trait ScalePort {
    /// Whether a conversion is ready right now (no waiting).
    fn data_ready(&mut self, channel: ScaleChannel) -> bool;

    /// Raw signed 24-bit conversion.
    fn read_raw(&mut self, channel: ScaleChannel, timeout: Duration) -> Result<i32, SensorError>;

    /// Calibrated mass in grams: `(raw - offset) / scale`.
    fn read_mass(&mut self, channel: ScaleChannel, timeout: Duration) -> Result<f32, SensorError>;

    /// Set the counts-per-gram factor.  Non-positive values are ignored.
    fn set_scale(&mut self, channel: ScaleChannel, scale: f32);

    /// Set the zero offset in raw counts.
    fn set_offset(&mut self, channel: ScaleChannel, offset: i32);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Forward,
    Reverse,
}

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Advance the dispenser stepper by one half-step.
    fn step(&mut self, direction: StepDirection);

    /// De-energise every stepper coil.
    fn all_off(&mut self);

    /// Half-steps per output-shaft revolution.
    fn steps_per_revolution(&self) -> u32;

    /// Switch the reservoir refill pump.
    fn set_water_pump(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Block storage port (driven adapter: domain ↔ EEPROM / NVS)
// ───────────────────────────────────────────────────────────────

/// Small byte-addressable persistent store.
///
/// `program` must leave the addressed range either fully old or fully new
/// on power loss.
pub trait BlockStorage {
    /// Bring the device up.  May be retried.
    fn init(&mut self) -> Result<(), StorageError>;

    /// Fill `buf` from `address`.
    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` at `address`.
    fn program(&mut self, address: u16, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain → companion)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the companion serial link.
pub trait LinkPort {
    /// Send one line.  The adapter appends `\r\n`.
    fn write_line(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Monotonic clock port
// ───────────────────────────────────────────────────────────────

/// Millisecond tick source.  Wraps at `u32::MAX`.
pub trait MonotonicClock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`FeederEvent`](super::events::FeederEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::FeederEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the dispenser)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a slot comes due.
///
/// The [`FeedingScheduler`](crate::scheduler::FeedingScheduler) only knows
/// about minutes and table entries; the implementor decides whether a
/// dispense can actually start.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, entry: &ScheduleEntry);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ScalePort`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The converter did not signal ready within the timeout.
    NotReady,
    /// A data or clock pin could not be driven or sampled.
    Bus,
}

/// Errors from [`BlockStorage`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Device not initialised or not responding.
    NotReady,
    /// Address range outside the device.
    OutOfRange,
    /// Generic I/O error from the backend.
    IoError,
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotReady => write!(f, "converter not ready"),
            Self::Bus => write!(f, "pin I/O failed"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotReady => write!(f, "storage not ready"),
            Self::OutOfRange => write!(f, "address out of range"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
