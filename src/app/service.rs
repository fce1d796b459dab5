//! Application service — the hexagonal core.
//!
//! [`FeederService`] owns the device state, time base, scheduler, dispense
//! sequencer and persistence gateway.  It exposes a hardware-agnostic API;
//! all I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!   ByteSource ──▶ ┌──────────────────────────────┐ ──▶ LinkPort
//!    ScalePort ──▶ │        FeederService          │ ──▶ EventSink
//! ActuatorPort ◀── │ Framer · Scheduler · Sequencer│
//! BlockStorage ◀──▶│ TimeBase · Persistence        │
//!                  └──────────────────────────────┘
//! ```
//!
//! Within one loop pass the caller runs [`poll_serial`](FeederService::poll_serial)
//! first, then whichever of the fast / sensor / schedule ticks are due, in
//! that order.

use embedded_hal::delay::DelayNs;
use heapless::String;
use log::{debug, info, warn};

use crate::clock::{CivilTime, HourMinute, ResyncTracker, TimeBase};
use crate::config::FeederConfig;
use crate::control::{FeedTask, Sequencer, StepOutcome};
use crate::error::{Alarm, CommandError};
use crate::persistence::{Calibration, PersistError, PersistenceGateway};
use crate::protocol::schedule_text;
use crate::protocol::{GETTIME_REQUEST, Response};
use crate::scheduler::{Amount, FeedingScheduler, ScheduleEntry};
use crate::serial::{ByteSource, Frame, LineFramer, MAX_LINE_LEN};

use super::commands::FeederCommand;
use super::events::{FeedSource, FeederEvent};
use super::ports::{
    ActuatorPort, BlockStorage, EventSink, LinkPort, ScaleChannel, ScalePort, SchedulerDelegate,
};
use super::state::{DeviceState, EatTracker, FeedSnapshot};

// ───────────────────────────────────────────────────────────────
// FeederService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct FeederService<S> {
    config: FeederConfig,
    state: DeviceState,
    time: TimeBase,
    resync: ResyncTracker,
    scheduler: FeedingScheduler,
    sequencer: Sequencer,
    persistence: PersistenceGateway<S>,
    framer: LineFramer,
    eat: EatTracker,
}

impl<S: BlockStorage> FeederService<S> {
    /// Construct the service.  Does **not** touch storage or the link;
    /// call [`start`](Self::start) next.
    pub fn new(config: FeederConfig, storage: S, boot_ms: u32) -> Self {
        Self {
            state: DeviceState::default(),
            time: TimeBase::new(boot_ms),
            resync: ResyncTracker::new(config.resync_interval_ms),
            scheduler: FeedingScheduler::new(),
            sequencer: Sequencer::new(&config),
            persistence: PersistenceGateway::new(storage),
            framer: LineFramer::new(),
            eat: EatTracker::new(config.eat_detect_min_g),
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up storage, apply persisted records and ask the companion for
    /// the time.
    pub fn start(
        &mut self,
        now_ms: u32,
        scale: &mut impl ScalePort,
        link: &mut impl LinkPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        let storage_online = self.persistence.init_with_retry(
            self.config.storage_init_attempts,
            self.config.storage_init_backoff(),
            delay,
        );
        self.state.set_alarm(Alarm::StorageOffline, !storage_online);
        self.state.set_alarm(Alarm::ClockUnset, !self.time.is_set());
        sink.emit(&FeederEvent::Started { storage_online });

        if storage_online {
            let calibration = match self.persistence.load_calibration() {
                Ok(cal) => {
                    self.state.calibration = cal;
                    true
                }
                Err(e) => {
                    info!("Calibration not loaded ({}), using defaults", e);
                    false
                }
            };
            let schedule = match self.persistence.load_schedule() {
                Ok(table) => {
                    self.scheduler.replace(table);
                    true
                }
                Err(e) => {
                    info!("Schedule not loaded ({}), starting empty", e);
                    false
                }
            };
            sink.emit(&FeederEvent::RecordsLoaded {
                calibration,
                schedule,
            });
        }
        self.apply_calibration(scale);

        self.request_time(now_ms, link, sink);
        info!("FeederService started");
    }

    // ── Serial input ──────────────────────────────────────────

    /// Drain `rx`, dispatching every complete line and writing one response
    /// per line to `link`.  Returns the number of lines answered.
    pub fn poll_serial(
        &mut self,
        rx: &mut impl ByteSource,
        now_ms: u32,
        hw: &mut (impl ScalePort + ActuatorPort),
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut answered = 0;
        while let Some(byte) = rx.pop_byte() {
            // Copy the line out so the framer borrow ends before dispatch.
            let line: Option<String<MAX_LINE_LEN>> = match self.framer.push(byte) {
                None => continue,
                Some(Frame::Malformed) => None,
                Some(Frame::Command(text)) => {
                    let mut owned = String::new();
                    // Frame text never exceeds MAX_LINE_LEN.
                    let _ = owned.push_str(text);
                    Some(owned)
                }
            };

            let response = match line {
                Some(text) => self.handle_line(&text, now_ms, hw, sink),
                None => Response::Err(CommandError::Syntax),
            };
            link.write_line(&response.to_line());
            answered += 1;
        }
        answered
    }

    /// Parse and execute one command line.
    pub fn handle_line(
        &mut self,
        line: &str,
        now_ms: u32,
        hw: &mut (impl ScalePort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Response {
        let response: Response = FeederCommand::parse(line)
            .and_then(|cmd| self.execute(cmd, now_ms, hw, sink))
            .into();
        if let Response::Err(e) = &response {
            debug!("'{}' -> {}", line, e);
        }
        response
    }

    /// Execute an already-parsed command.
    pub fn execute(
        &mut self,
        cmd: FeederCommand,
        now_ms: u32,
        hw: &mut (impl ScalePort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Result<Response, CommandError> {
        match cmd {
            FeederCommand::Status => Ok(self.status(now_ms)),
            FeederCommand::Feed(amount) => {
                start_feed(
                    &mut self.sequencer,
                    &mut self.eat,
                    amount,
                    now_ms,
                    hw.steps_per_revolution(),
                    FeedSource::Manual,
                    sink,
                )?;
                Ok(Response::Ok)
            }
            FeederCommand::Log => Ok(self.log()),
            FeederCommand::Tare(channel) => {
                let raw = hw.read_raw(channel, self.config.sensor_timeout())?;
                self.state.calibration.channel_mut(channel).offset = raw;
                hw.set_offset(channel, raw);
                info!("Tare {:?}: offset={}", channel, raw);
                self.persist_calibration(sink);
                Ok(Response::Ok)
            }
            FeederCommand::Calibrate { channel, weight_g } => {
                let raw = hw.read_raw(channel, self.config.sensor_timeout())?;
                let offset = self.state.calibration.channel(channel).offset;
                let scale = (i64::from(raw) - i64::from(offset)) as f32 / weight_g as f32;
                if !(scale.is_finite() && scale > 0.0) {
                    warn!("Calibrate {:?}: scale {} rejected", channel, scale);
                    return Err(CommandError::CalErr);
                }
                self.state.calibration.channel_mut(channel).scale = scale;
                hw.set_scale(channel, scale);
                info!("Calibrate {:?}: scale={} counts/g", channel, scale);
                self.persist_calibration(sink);
                Ok(Response::Ok)
            }
            FeederCommand::SetTime(unix_secs) => {
                self.time.set(unix_secs, now_ms);
                self.resync.satisfied();
                self.state.clear(Alarm::ClockUnset);
                sink.emit(&FeederEvent::TimeSynced { unix_secs });
                Ok(Response::Ok)
            }
            FeederCommand::Schedule(table) => {
                self.scheduler.replace(table);
                self.persist_schedule(sink);
                Ok(Response::Ok)
            }
            FeederCommand::GetSchedule => Ok(Response::Data(schedule_text::format_table(
                self.scheduler.entries(),
            ))),
            FeederCommand::StorageDiag => {
                let ok = self.persistence.check_integrity();
                Ok(Response::text(if ok { "PASS" } else { "FAIL" }))
            }
        }
    }

    // ── Periodic ticks ────────────────────────────────────────

    /// Fast cadence: advance the dispense by at most one pulse.
    pub fn tick_fast(&mut self, now_ms: u32, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        match self.sequencer.tick(now_ms, hw) {
            StepOutcome::Idle | StepOutcome::Running => {}
            StepOutcome::Completed {
                amount,
                grams,
                forced,
            } => {
                if let Some(now) = self.time.now(now_ms) {
                    self.state.last_fed.time = Some(now);
                }
                self.state.last_fed.grams = i32::from(grams);
                self.state.set_alarm(Alarm::FeedJam, forced);
                self.eat.disarm();
                sink.emit(&FeederEvent::FeedCompleted {
                    amount,
                    grams,
                    forced,
                });
            }
            StepOutcome::Aborted { steps_remaining } => {
                self.eat.disarm();
                sink.emit(&FeederEvent::FeedAborted { steps_remaining });
            }
        }
    }

    /// Sensor cadence: sample whichever load cells have a conversion ready.
    pub fn tick_sensors(
        &mut self,
        now_ms: u32,
        hw: &mut (impl ScalePort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        let timeout = self.config.sample_timeout();

        if hw.data_ready(ScaleChannel::Food) {
            if let Ok(mass) = hw.read_mass(ScaleChannel::Food, timeout) {
                self.state.bowl_g = whole_grams(mass);
                if self.sequencer.is_busy() {
                    self.eat.disarm();
                } else if let Some(grams) = self.eat.observe(self.state.bowl_g) {
                    self.state.last_eaten = FeedSnapshot {
                        time: self.time.now(now_ms).or(self.state.last_eaten.time),
                        grams,
                    };
                    sink.emit(&FeederEvent::EatDetected { grams });
                }
            }
        }

        if hw.data_ready(ScaleChannel::Water) {
            if let Ok(mass) = hw.read_mass(ScaleChannel::Water, timeout) {
                self.state.water_g = whole_grams(mass);
                let low = self.state.water_g < self.config.water_refill_threshold_g;
                hw.set_water_pump(low);
                self.state.set_alarm(Alarm::WaterLow, low);
                if low != self.state.pump_on {
                    self.state.pump_on = low;
                    sink.emit(&FeederEvent::PumpChanged { on: low });
                }
            }
        }
    }

    /// Slow cadence: resend a pending time request, then evaluate the schedule.
    pub fn tick_schedule(
        &mut self,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        if self.resync.poll(now_ms) {
            link.write_line(GETTIME_REQUEST);
            sink.emit(&FeederEvent::ResyncRequested);
        }

        let now_unix = self.time.now(now_ms);
        let steps_per_rev = hw.steps_per_revolution();
        let mut starter = ScheduledFeed {
            sequencer: &mut self.sequencer,
            eat: &mut self.eat,
            now_ms,
            steps_per_rev,
            sink,
        };
        self.scheduler.tick(now_unix, &mut starter);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn config(&self) -> &FeederConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.sequencer.is_busy()
    }

    pub fn active_task(&self) -> Option<&FeedTask> {
        self.sequencer.task()
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        self.scheduler.entries()
    }

    /// Wall-clock seconds, `None` until SETTIME.
    pub fn wall_clock(&self, now_ms: u32) -> Option<u32> {
        self.time.now(now_ms)
    }

    pub fn resync_pending(&self) -> bool {
        self.resync.is_pending()
    }

    pub fn persistence(&self) -> &PersistenceGateway<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut PersistenceGateway<S> {
        &mut self.persistence
    }

    // ── Internal ──────────────────────────────────────────────

    fn status(&self, now_ms: u32) -> Response {
        let time = CivilTime::from_unix(self.time.seconds_at(now_ms));
        Response::data(format_args!(
            "TIME={},BOWL={},WATER={},ALARM={},BUSY={}",
            time,
            self.state.bowl_g,
            self.state.water_g,
            self.state.alarms,
            u8::from(self.sequencer.is_busy())
        ))
    }

    fn log(&self) -> Response {
        let fed = &self.state.last_fed;
        let eaten = &self.state.last_eaten;
        Response::data(format_args!(
            "FED_TIME={},FED_AMT={},EAT_TIME={},EAT_AMT={}",
            HourMinute(fed.time),
            fed.grams,
            HourMinute(eaten.time),
            eaten.grams
        ))
    }

    fn request_time(&mut self, now_ms: u32, link: &mut impl LinkPort, sink: &mut impl EventSink) {
        link.write_line(GETTIME_REQUEST);
        self.resync.requested(now_ms);
        sink.emit(&FeederEvent::ResyncRequested);
    }

    fn apply_calibration(&self, scale: &mut impl ScalePort) {
        let Calibration { food, water } = self.state.calibration;
        scale.set_scale(ScaleChannel::Food, food.scale);
        scale.set_offset(ScaleChannel::Food, food.offset);
        scale.set_scale(ScaleChannel::Water, water.scale);
        scale.set_offset(ScaleChannel::Water, water.offset);
    }

    fn persist_calibration(&mut self, sink: &mut impl EventSink) {
        let result = self.persistence.save_calibration(&self.state.calibration);
        report_save("calibration", result, sink);
    }

    fn persist_schedule(&mut self, sink: &mut impl EventSink) {
        let result = self.persistence.save_schedule(self.scheduler.entries());
        report_save("schedule", result, sink);
    }
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Bridges the scheduler to the sequencer for one slow tick.
struct ScheduledFeed<'a, E: EventSink> {
    sequencer: &'a mut Sequencer,
    eat: &'a mut EatTracker,
    now_ms: u32,
    steps_per_rev: u32,
    sink: &'a mut E,
}

impl<E: EventSink> SchedulerDelegate for ScheduledFeed<'_, E> {
    fn on_schedule_fired(&mut self, entry: &ScheduleEntry) {
        let started = start_feed(
            self.sequencer,
            self.eat,
            entry.amount(),
            self.now_ms,
            self.steps_per_rev,
            FeedSource::Scheduled,
            self.sink,
        );
        if started.is_err() {
            self.sink.emit(&FeederEvent::ScheduleSkipped {
                hour: entry.hour(),
                minute: entry.minute(),
            });
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Helpers
// ───────────────────────────────────────────────────────────────

/// Shared by manual and scheduled dispenses.
fn start_feed(
    sequencer: &mut Sequencer,
    eat: &mut EatTracker,
    amount: Amount,
    now_ms: u32,
    steps_per_rev: u32,
    source: FeedSource,
    sink: &mut impl EventSink,
) -> Result<FeedTask, CommandError> {
    let task = sequencer.start(amount, now_ms, steps_per_rev)?;
    eat.disarm();
    sink.emit(&FeederEvent::FeedStarted {
        amount,
        steps: task.steps_remaining,
        source,
    });
    Ok(task)
}

fn report_save(record: &'static str, result: Result<(), PersistError>, sink: &mut impl EventSink) {
    if let Err(e) = result {
        warn!("Saving {} failed: {}", record, e);
    }
    sink.emit(&FeederEvent::RecordSaved {
        record,
        ok: result.is_ok(),
    });
}

/// Round to the nearest whole gram, half away from zero.
fn whole_grams(mass: f32) -> i32 {
    mass.round() as i32
}
