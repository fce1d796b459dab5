//! Dispenser stepper driver (28BYJ-48 through a ULN2003 darlington array).
//!
//! Half-step drive: eight coil patterns per electrical cycle, 4096
//! half-steps per output-shaft revolution.  The driver only emits one
//! pattern per call; pacing belongs to the sequencer.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` output pins.  On ESP-IDF the pins are
//! [`GpioOutput`](super::hw_init::GpioOutput) handles; host tests use mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::info;

use crate::app::ports::StepDirection;

/// Half-steps per output-shaft revolution (64 x 63.68 gearbox, rounded).
pub const HALF_STEPS_PER_REV: u32 = 4096;

/// Coil patterns, bit 3 = IN1 .. bit 0 = IN4.
const HALF_STEP_SEQUENCE: [u8; 8] = [
    0b1000, 0b1100, 0b0100, 0b0110, 0b0010, 0b0011, 0b0001, 0b1001,
];

/// Self-test wiggle.
const SELF_TEST_STEPS: u32 = 16;
const SELF_TEST_DELAY_MS: u32 = 30;

pub struct Uln2003<P> {
    coils: [P; 4],
    phase: usize,
    steps_taken: u64,
}

impl<P: OutputPin> Uln2003<P> {
    /// Takes IN1..IN4 in order.  All coils start de-energised.
    pub fn new(in1: P, in2: P, in3: P, in4: P) -> Self {
        let mut driver = Self {
            coils: [in1, in2, in3, in4],
            phase: 0,
            steps_taken: 0,
        };
        driver.release();
        driver
    }

    /// Advance one half-step and energise the new pattern.
    pub fn step(&mut self, direction: StepDirection) {
        self.phase = match direction {
            StepDirection::Forward => (self.phase + 1) % HALF_STEP_SEQUENCE.len(),
            StepDirection::Reverse => {
                (self.phase + HALF_STEP_SEQUENCE.len() - 1) % HALF_STEP_SEQUENCE.len()
            }
        };
        self.apply(HALF_STEP_SEQUENCE[self.phase]);
        self.steps_taken += 1;
    }

    /// De-energise every coil.
    pub fn release(&mut self) {
        self.apply(0);
    }

    /// Short forward-then-back wiggle so a jammed auger is obvious at boot.
    pub fn self_test(&mut self, delay: &mut impl DelayNs) {
        for direction in [StepDirection::Forward, StepDirection::Reverse] {
            for _ in 0..SELF_TEST_STEPS {
                self.step(direction);
                delay.delay_ms(SELF_TEST_DELAY_MS);
            }
        }
        self.release();
        info!("Stepper: self-test done ({} half-steps each way)", SELF_TEST_STEPS);
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Lifetime half-step count, both directions.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    fn apply(&mut self, pattern: u8) {
        for (i, coil) in self.coils.iter_mut().enumerate() {
            let on = pattern & (0b1000 >> i) != 0;
            // GPIO writes on this board are infallible.
            let _ = if on { coil.set_high() } else { coil.set_low() };
        }
    }
}
