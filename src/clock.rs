//! Wall-clock time base.
//!
//! The device has no RTC.  Wall-clock seconds are derived from the
//! monotonic millisecond counter plus an anchor set by the companion:
//!
//! ```text
//! now = anchor_unix + (tick_ms - anchor_tick_ms) / 1000
//! ```
//!
//! All elapsed-time arithmetic uses `wrapping_sub` so the u32 millisecond
//! counter may roll over.  Until the first SETTIME the anchor is 0 and the
//! clock reports itself as unset; a [`ResyncTracker`] keeps asking the
//! companion for the time at a fixed interval while that is the case.

use core::fmt;

const SECS_PER_DAY: u32 = 86_400;

/// Monotonic-to-wall-clock mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    anchor_unix: u32,
    anchor_tick_ms: u32,
}

impl TimeBase {
    /// Unset time base anchored at `boot_ms`.
    pub const fn new(boot_ms: u32) -> Self {
        Self {
            anchor_unix: 0,
            anchor_tick_ms: boot_ms,
        }
    }

    pub const fn is_set(&self) -> bool {
        self.anchor_unix != 0
    }

    /// Rebase to `unix_secs` at tick `now_ms`.
    pub fn set(&mut self, unix_secs: u32, now_ms: u32) {
        self.anchor_unix = unix_secs;
        self.anchor_tick_ms = now_ms;
    }

    /// Wall-clock seconds, or `None` while unset.
    pub fn now(&self, now_ms: u32) -> Option<u32> {
        self.is_set().then(|| self.seconds_at(now_ms))
    }

    /// Seconds for display.  While unset this counts up from the epoch, so
    /// STATUS still shows a moving clock.
    pub fn seconds_at(&self, now_ms: u32) -> u32 {
        let elapsed_ms = now_ms.wrapping_sub(self.anchor_tick_ms);
        self.anchor_unix.wrapping_add(elapsed_ms / 1000)
    }
}

/// Tracks the outstanding GETTIME request.
#[derive(Debug, Clone, Copy)]
pub struct ResyncTracker {
    pending: bool,
    last_request_ms: u32,
    interval_ms: u32,
}

impl ResyncTracker {
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            pending: false,
            last_request_ms: 0,
            interval_ms,
        }
    }

    /// Record that a request was just sent.
    pub fn requested(&mut self, now_ms: u32) {
        self.pending = true;
        self.last_request_ms = now_ms;
    }

    /// Returns `true` when a pending request is due to be resent.  The caller
    /// must send it; the retry timer is restarted here.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if !self.pending || now_ms.wrapping_sub(self.last_request_ms) < self.interval_ms {
            return false;
        }
        self.last_request_ms = now_ms;
        true
    }

    /// SETTIME arrived.
    pub fn satisfied(&mut self) {
        self.pending = false;
    }

    pub const fn is_pending(&self) -> bool {
        self.pending
    }
}

// ── Calendar conversion ───────────────────────────────────────

/// Broken-down UTC (or companion-local) time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilTime {
    pub fn from_unix(unix_secs: u32) -> Self {
        let days = unix_secs / SECS_PER_DAY;
        let secs = unix_secs % SECS_PER_DAY;

        // Days-from-civil inverse (proleptic Gregorian, era = 400 years).
        let z = i64::from(days) + 719_468;
        let era = z / 146_097;
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = doy - (153 * mp + 2) / 5 + 1;
        let month = if mp < 10 { mp + 3 } else { mp - 9 };
        let year = yoe + era * 400 + i64::from(month <= 2);

        Self {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            hour: (secs / 3600) as u8,
            minute: ((secs % 3600) / 60) as u8,
            second: (secs % 60) as u8,
        }
    }
}

impl fmt::Display for CivilTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// `HH:MM` for a known timestamp, `--:--` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourMinute(pub Option<u32>);

impl fmt::Display for HourMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(unix) => {
                let secs = unix % SECS_PER_DAY;
                write!(f, "{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
            }
            None => f.write_str("--:--"),
        }
    }
}
