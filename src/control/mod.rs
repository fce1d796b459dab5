//! Actuation control.

pub mod sequencer;

pub use sequencer::{FeedTask, Sequencer, StepOutcome, degrees_to_steps};
