//! Outbound application events.
//!
//! The [`FeederService`](super::service::FeederService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (log to console, count, etc.).

use crate::scheduler::Amount;

/// Why a dispense started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Manual,
    Scheduled,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum FeederEvent {
    /// The service has started.  `storage_online` is false when every
    /// storage init attempt failed.
    Started { storage_online: bool },

    /// Persisted calibration / schedule records were applied at boot.
    RecordsLoaded { calibration: bool, schedule: bool },

    /// A record was written (or failed to be written).
    RecordSaved { record: &'static str, ok: bool },

    /// A dispense task began.
    FeedStarted { amount: Amount, steps: u32, source: FeedSource },

    /// A dispense task finished.  `forced` when cut short by its deadline.
    FeedCompleted { amount: Amount, grams: u16, forced: bool },

    /// A dispense task was discarded by the step ceiling.
    FeedAborted { steps_remaining: u32 },

    /// A schedule slot came due while a dispense was running and was dropped.
    ScheduleSkipped { hour: u8, minute: u8 },

    /// The wall clock was (re)anchored by SETTIME.
    TimeSynced { unix_secs: u32 },

    /// A GETTIME request was sent to the companion.
    ResyncRequested,

    /// A bowl weight drop was recorded as the pet eating.
    EatDetected { grams: i32 },

    /// Reservoir refill pump switched.
    PumpChanged { on: bool },
}
