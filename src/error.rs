//! Unified error types for the PetFeeder firmware.
//!
//! [`CommandError`] is the wire-level taxonomy: every dispatcher failure
//! funnels into one of its variants and is reported as `+ERR: <code>`.
//! All variants are `Copy` so handlers can bail out with `?` without
//! allocation.

use core::fmt;

use crate::app::ports::SensorError;

// ---------------------------------------------------------------------------
// Command errors (reported on the wire)
// ---------------------------------------------------------------------------

/// Every rejected command maps to exactly one of these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Line did not contain the `AT+` marker.
    Syntax,
    /// Command name not recognised.
    UnknownCmd,
    /// Missing or malformed parameter.
    ParamErr,
    /// A feed task is already running.
    Busy,
    /// Load cell did not become ready within the bounded wait.
    Timeout,
    /// Calibration produced a non-positive scale.
    CalErr,
    /// SETTIME value was zero or not a number.
    InvalidTimestamp,
}

impl CommandError {
    /// Wire code sent after `+ERR: `.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Syntax => "SYNTAX",
            Self::UnknownCmd => "UNKNOWN_CMD",
            Self::ParamErr => "PARAM_ERR",
            Self::Busy => "BUSY",
            Self::Timeout => "TIMEOUT",
            Self::CalErr => "CAL_ERR",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<SensorError> for CommandError {
    fn from(_: SensorError) -> Self {
        Self::Timeout
    }
}

// ---------------------------------------------------------------------------
// Alarm bits
// ---------------------------------------------------------------------------

/// Conditions reported in the `ALARM=` field of STATUS.  Accumulated in a
/// bitfield so several can be raised at once and cleared individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Alarm {
    /// Water reservoir below the refill threshold.
    WaterLow = 0b0000_0001,
    /// Last dispense was cut short by its deadline (auger jam).
    FeedJam = 0b0000_0010,
    /// Wall clock has never been set.
    ClockUnset = 0b0000_0100,
    /// Persistent storage failed to initialise.
    StorageOffline = 0b0000_1000,
}

impl Alarm {
    /// Return the bitmask for this alarm.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaterLow => write!(f, "water low"),
            Self::FeedJam => write!(f, "feed jam"),
            Self::ClockUnset => write!(f, "clock unset"),
            Self::StorageOffline => write!(f, "storage offline"),
        }
    }
}
