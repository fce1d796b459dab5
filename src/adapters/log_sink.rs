//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to the USB-CDC console in production,
//! separate from the companion UART).

use log::{info, warn};

use crate::app::events::FeederEvent;
use crate::app::ports::EventSink;
use crate::clock::CivilTime;

/// Adapter that logs every [`FeederEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &FeederEvent) {
        match event {
            FeederEvent::Started { storage_online } => {
                info!(
                    "START | storage={}",
                    if *storage_online { "online" } else { "OFFLINE" }
                );
            }
            FeederEvent::RecordsLoaded {
                calibration,
                schedule,
            } => {
                info!("STORE | loaded calibration={} schedule={}", calibration, schedule);
            }
            FeederEvent::RecordSaved { record, ok } => {
                if *ok {
                    info!("STORE | {} saved", record);
                } else {
                    warn!("STORE | {} NOT saved", record);
                }
            }
            FeederEvent::FeedStarted {
                amount,
                steps,
                source,
            } => {
                info!("FEED  | start {:?} ({} steps, {:?})", amount, steps, source);
            }
            FeederEvent::FeedCompleted {
                amount,
                grams,
                forced,
            } => {
                if *forced {
                    warn!("FEED  | {:?} cut short by deadline (~{} g)", amount, grams);
                } else {
                    info!("FEED  | {:?} done (~{} g)", amount, grams);
                }
            }
            FeederEvent::FeedAborted { steps_remaining } => {
                warn!("FEED  | aborted, {} steps exceeds ceiling", steps_remaining);
            }
            FeederEvent::ScheduleSkipped { hour, minute } => {
                warn!("SCHED | {:02}:{:02} skipped, dispenser busy", hour, minute);
            }
            FeederEvent::TimeSynced { unix_secs } => {
                info!("TIME  | synced to {}", CivilTime::from_unix(*unix_secs));
            }
            FeederEvent::ResyncRequested => {
                info!("TIME  | GETTIME sent");
            }
            FeederEvent::EatDetected { grams } => {
                info!("BOWL  | pet ate {} g", grams);
            }
            FeederEvent::PumpChanged { on } => {
                info!("WATER | refill pump {}", if *on { "ON" } else { "off" });
            }
        }
    }
}
