//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod hw_init;
pub mod hw_timer;
pub mod pump;
pub mod stepper;
pub mod task;
pub mod watchdog;
