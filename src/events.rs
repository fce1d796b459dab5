//! Timer-driven tick base and cadence flags.
//!
//! A 1 kHz hardware timer callback advances the millisecond counter and
//! raises one flag per cadence whose period has elapsed.  The main control
//! loop consumes the flags with [`take`] and runs the matching handler.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────────────┐      ┌──────────────┐
//! │ esp_timer   │─────▶│ MILLIS (AtomicU32)  │─────▶│  Main Loop   │
//! │ 1 kHz       │      │ FAST / SENSOR /     │      │  (consumer)  │
//! │ callback    │      │ SCHEDULE flags      │      │              │
//! └─────────────┘      └─────────────────────┘      └──────────────┘
//! ```
//!
//! Flags are level-triggered: if the loop falls behind, several elapsed
//! periods collapse into a single pending flag.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Periodic handlers driven by the tick base, in the order the loop runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Actuation stepping (10 ms).
    Fast,
    /// Load-cell sampling (100 ms).
    Sensor,
    /// Schedule evaluation and resync (1000 ms).
    Schedule,
}

// ── Shared state (timer callback writes, main loop reads) ─────

static MILLIS: AtomicU32 = AtomicU32::new(0);

static FAST_PERIOD: AtomicU32 = AtomicU32::new(10);
static SENSOR_PERIOD: AtomicU32 = AtomicU32::new(100);
static SCHEDULE_PERIOD: AtomicU32 = AtomicU32::new(1000);

static FAST_DUE: AtomicBool = AtomicBool::new(false);
static SENSOR_DUE: AtomicBool = AtomicBool::new(false);
static SCHEDULE_DUE: AtomicBool = AtomicBool::new(false);

/// Override the cadence periods.  Call once at boot before the timer starts.
pub fn configure(fast_ms: u32, sensor_ms: u32, schedule_ms: u32) {
    FAST_PERIOD.store(fast_ms.max(1), Ordering::Relaxed);
    SENSOR_PERIOD.store(sensor_ms.max(1), Ordering::Relaxed);
    SCHEDULE_PERIOD.store(schedule_ms.max(1), Ordering::Relaxed);
}

/// Advance the tick base by one millisecond.
/// Safe to call from timer/ISR context (lock-free, never blocks).
pub fn on_millisecond_tick() {
    let now = MILLIS.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

    if now % FAST_PERIOD.load(Ordering::Relaxed) == 0 {
        FAST_DUE.store(true, Ordering::Release);
    }
    if now % SENSOR_PERIOD.load(Ordering::Relaxed) == 0 {
        SENSOR_DUE.store(true, Ordering::Release);
    }
    if now % SCHEDULE_PERIOD.load(Ordering::Relaxed) == 0 {
        SCHEDULE_DUE.store(true, Ordering::Release);
    }
}

/// Milliseconds since boot.  Wraps after ~49.7 days; compare with
/// `wrapping_sub`.
pub fn millis() -> u32 {
    MILLIS.load(Ordering::Acquire)
}

/// Consume the pending flag for `cadence`.  Returns `true` at most once
/// per raised flag.
pub fn take(cadence: Cadence) -> bool {
    flag(cadence).swap(false, Ordering::AcqRel)
}

fn flag(cadence: Cadence) -> &'static AtomicBool {
    match cadence {
        Cadence::Fast => &FAST_DUE,
        Cadence::Sensor => &SENSOR_DUE,
        Cadence::Schedule => &SCHEDULE_DUE,
    }
}
