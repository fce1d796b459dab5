//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the business rules of the feeder: command parsing
//! and dispatch, device state, and the tick handlers that drive the
//! dispenser, load cells and feeding schedule.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
