//! Non-blocking dispense sequencer.
//!
//! A feed task is a countdown of stepper pulses spaced by a fixed delay and
//! bounded by an absolute deadline.  [`Sequencer::tick`] runs on the fast
//! cadence and emits at most one pulse per call, so the control loop is
//! never blocked for the duration of a dispense.
//!
//! Per tick, in order:
//! 1. step ceiling exceeded → task aborted, coils released, no snapshot;
//! 2. deadline passed → remaining steps zeroed (forced completion);
//! 3. next-step time reached → one forward pulse, next = now + delay;
//! 4. nothing remaining → task completed, coils released.
//!
//! While idle every tick releases the coils.

use log::{debug, warn};

use crate::app::ports::{ActuatorPort, StepDirection};
use crate::config::FeederConfig;
use crate::error::CommandError;
use crate::scheduler::Amount;

/// Convert an auger rotation to half-steps, rounding to nearest.
pub const fn degrees_to_steps(degrees: u32, steps_per_rev: u32) -> u32 {
    ((degrees as u64 * steps_per_rev as u64 + 180) / 360) as u32
}

/// `true` once `now` is at or past `deadline` on the wrapping u32 clock.
#[inline]
pub const fn deadline_reached(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) >= 0
}

/// The in-flight dispense.  At most one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedTask {
    pub amount: Amount,
    pub steps_remaining: u32,
    pub step_delay_ms: u32,
    pub next_step_ms: u32,
    pub deadline_ms: u32,
    pub grams: u16,
}

/// Result of one [`Sequencer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No task.
    Idle,
    /// Task still running.
    Running,
    /// Task finished.  `forced` when the deadline cut it short.
    Completed { amount: Amount, grams: u16, forced: bool },
    /// Task exceeded the step ceiling and was discarded.
    Aborted { steps_remaining: u32 },
}

pub struct Sequencer {
    task: Option<FeedTask>,
    step_delay_ms: u32,
    deadline_margin_ms: u32,
    max_feed_steps: u32,
    feed_degrees: [u32; 3],
    feed_grams: [u16; 3],
}

impl Sequencer {
    pub fn new(config: &FeederConfig) -> Self {
        Self {
            task: None,
            step_delay_ms: config.step_delay_ms,
            deadline_margin_ms: config.deadline_margin_ms,
            max_feed_steps: config.max_feed_steps,
            feed_degrees: config.feed_degrees,
            feed_grams: config.feed_grams,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    pub fn task(&self) -> Option<&FeedTask> {
        self.task.as_ref()
    }

    /// Nominal grams dispensed for `amount`.
    pub fn grams_for(&self, amount: Amount) -> u16 {
        self.feed_grams[amount.index()]
    }

    /// Start a dispense.  The first pulse is due immediately.
    pub fn start(
        &mut self,
        amount: Amount,
        now_ms: u32,
        steps_per_rev: u32,
    ) -> Result<FeedTask, CommandError> {
        if self.task.is_some() {
            return Err(CommandError::Busy);
        }

        let steps = degrees_to_steps(self.feed_degrees[amount.index()], steps_per_rev);
        let budget = steps
            .saturating_mul(self.step_delay_ms)
            .saturating_add(self.deadline_margin_ms);
        let task = FeedTask {
            amount,
            steps_remaining: steps,
            step_delay_ms: self.step_delay_ms,
            next_step_ms: now_ms,
            deadline_ms: now_ms.wrapping_add(budget),
            grams: self.grams_for(amount),
        };
        debug!(
            "Sequencer: start {} steps, deadline in {} ms",
            steps, budget
        );
        self.task = Some(task);
        Ok(task)
    }

    /// Advance the active task by at most one pulse.
    pub fn tick(&mut self, now_ms: u32, hw: &mut impl ActuatorPort) -> StepOutcome {
        let Some(task) = self.task.as_mut() else {
            hw.all_off();
            return StepOutcome::Idle;
        };

        if task.steps_remaining > self.max_feed_steps {
            let steps_remaining = task.steps_remaining;
            warn!(
                "Sequencer: {} steps exceeds ceiling {}, aborting",
                steps_remaining, self.max_feed_steps
            );
            self.task = None;
            hw.all_off();
            return StepOutcome::Aborted { steps_remaining };
        }

        let mut forced = false;
        if task.steps_remaining > 0 && deadline_reached(now_ms, task.deadline_ms) {
            warn!(
                "Sequencer: deadline passed with {} steps left",
                task.steps_remaining
            );
            task.steps_remaining = 0;
            forced = true;
        }

        if task.steps_remaining > 0 && deadline_reached(now_ms, task.next_step_ms) {
            hw.step(StepDirection::Forward);
            task.steps_remaining -= 1;
            task.next_step_ms = now_ms.wrapping_add(task.step_delay_ms);
        }

        if task.steps_remaining > 0 {
            return StepOutcome::Running;
        }

        let FeedTask { amount, grams, .. } = *task;
        self.task = None;
        hw.all_off();
        StepOutcome::Completed {
            amount,
            grams,
            forced,
        }
    }
}
