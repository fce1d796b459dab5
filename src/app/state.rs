//! Device state owned by the control loop.

use crate::error::Alarm;
use crate::persistence::Calibration;

/// Time and amount of the most recent dispense or meal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    /// Wall-clock seconds; `None` until an event happens with a valid clock.
    pub time: Option<u32>,
    pub grams: i32,
}

/// Everything the dispatcher and tick handlers read or mutate.
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Bowl load cell, whole grams.
    pub bowl_g: i32,
    /// Reservoir load cell, whole grams.
    pub water_g: i32,
    /// [`Alarm`] bitfield.
    pub alarms: u8,
    pub last_fed: FeedSnapshot,
    pub last_eaten: FeedSnapshot,
    /// Mirror of the calibration applied to the load cells.
    pub calibration: Calibration,
    pub pump_on: bool,
}

impl DeviceState {
    pub fn raise(&mut self, alarm: Alarm) {
        self.alarms |= alarm.mask();
    }

    pub fn clear(&mut self, alarm: Alarm) {
        self.alarms &= !alarm.mask();
    }

    pub fn set_alarm(&mut self, alarm: Alarm, active: bool) {
        if active {
            self.raise(alarm);
        } else {
            self.clear(alarm);
        }
    }

    pub fn has(&self, alarm: Alarm) -> bool {
        self.alarms & alarm.mask() != 0
    }
}

/// Detects the pet eating from bowl weight drops.
///
/// Tracks a reference reading; a drop of at least `min_drop_g` below it is
/// reported and becomes the new reference.  Increases (refills) move the
/// reference up.  Disarmed while the dispenser runs.
#[derive(Debug, Clone, Copy)]
pub struct EatTracker {
    reference_g: Option<i32>,
    min_drop_g: i32,
}

impl EatTracker {
    pub const fn new(min_drop_g: i32) -> Self {
        Self {
            reference_g: None,
            min_drop_g,
        }
    }

    /// Forget the reference (bowl contents are changing on purpose).
    pub fn disarm(&mut self) {
        self.reference_g = None;
    }

    /// Feed a bowl reading.  Returns grams eaten when a drop is detected.
    pub fn observe(&mut self, bowl_g: i32) -> Option<i32> {
        let Some(reference) = self.reference_g else {
            self.reference_g = Some(bowl_g);
            return None;
        };
        if bowl_g >= reference {
            self.reference_g = Some(bowl_g);
            return None;
        }
        let eaten = reference - bowl_g;
        if eaten >= self.min_drop_g {
            self.reference_g = Some(bowl_g);
            Some(eaten)
        } else {
            None
        }
    }
}
