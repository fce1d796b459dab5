//! Daily feeding scheduler.
//!
//! Holds a table of up to [`MAX_ENTRIES`] time-of-day slots and evaluates it
//! once per wall-clock minute.  When a slot matches, the scheduler notifies a
//! [`SchedulerDelegate`]; the delegate decides whether the dispenser can
//! actually start (it may be busy, in which case the slot is lost).
//!
//! ```text
//!  slow tick ──▶ FeedingScheduler::tick(now) ──▶ minute changed?
//!                                                  │ yes
//!                                                  ▼
//!                         first entry with entry.minute_of_day() == minute
//!                                                  │
//!                                                  ▼
//!                               SchedulerDelegate::on_schedule_fired()
//! ```

use heapless::Vec;
use log::{debug, info};

use crate::app::ports::SchedulerDelegate;

/// Maximum number of daily slots.
pub const MAX_ENTRIES: usize = 8;

const SECS_PER_DAY: u32 = 86_400;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// Portion size class.  Maps to an auger rotation and a nominal gram value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Low,
    Mid,
    High,
}

impl Amount {
    /// Parse the single-letter wire code (`L`, `M`, `H`).
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            b'L' => Some(Self::Low),
            b'M' => Some(Self::Mid),
            b'H' => Some(Self::High),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Low => b'L',
            Self::Mid => b'M',
            Self::High => b'H',
        }
    }

    /// Index into the per-class config arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Mid => 1,
            Self::High => 2,
        }
    }
}

/// One daily slot.  Construct through [`ScheduleEntry::new`] so the time is
/// always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    hour: u8,
    minute: u8,
    amount: Amount,
}

impl ScheduleEntry {
    pub const fn new(hour: u8, minute: u8, amount: Amount) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            amount,
        })
    }

    pub const fn hour(&self) -> u8 {
        self.hour
    }

    pub const fn minute(&self) -> u8 {
        self.minute
    }

    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Minutes since midnight (0–1439).
    pub const fn minute_of_day(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

/// Fixed-capacity table; insertion order is trigger priority.
pub type ScheduleTable = Vec<ScheduleEntry, MAX_ENTRIES>;

/// Minute of the day (0–1439) for a wall-clock timestamp.
pub const fn minute_of_day(unix_secs: u32) -> u16 {
    ((unix_secs % SECS_PER_DAY) / 60) as u16
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Decoupled from the dispenser: when a slot fires it invokes the
/// [`SchedulerDelegate`] rather than starting a task itself.
pub struct FeedingScheduler {
    entries: ScheduleTable,
    /// Last evaluated minute-of-day.  `None` until the first evaluation
    /// with a valid clock primes it.
    last_minute: Option<u16>,
}

impl FeedingScheduler {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            last_minute: None,
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Replace the whole table.
    pub fn replace(&mut self, entries: ScheduleTable) {
        info!("Scheduler: table replaced ({} entries)", entries.len());
        self.entries = entries;
    }

    /// Tick the scheduler.  Call once per slow tick.
    ///
    /// * `now_unix` — wall-clock seconds, or `None` while the clock is
    ///   unset (evaluation is skipped entirely).
    /// * `delegate` — receives the first slot matching a newly entered minute.
    pub fn tick(&mut self, now_unix: Option<u32>, delegate: &mut dyn SchedulerDelegate) {
        let Some(now) = now_unix else {
            return;
        };
        let minute = minute_of_day(now);

        match self.last_minute {
            None => {
                debug!("Scheduler: cursor primed at minute {}", minute);
                self.last_minute = Some(minute);
                return;
            }
            Some(last) if last == minute => return,
            Some(_) => self.last_minute = Some(minute),
        }

        if let Some(entry) = self.entries.iter().find(|e| e.minute_of_day() == minute) {
            info!(
                "Scheduler: slot {:02}:{:02} ({}) due",
                entry.hour(),
                entry.minute(),
                entry.amount().code() as char
            );
            delegate.on_schedule_fired(entry);
        }
    }
}

impl Default for FeedingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
