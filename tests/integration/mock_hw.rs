//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO registers, and lets tests script the
//! load-cell readings and storage faults.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;

use petfeeder::app::events::FeederEvent;
use petfeeder::app::ports::{
    ActuatorPort, BlockStorage, EventSink, LinkPort, ScaleChannel, ScalePort, SensorError,
    StepDirection, StorageError,
};
use petfeeder::app::service::FeederService;
use petfeeder::config::FeederConfig;
use petfeeder::serial::{RX_RING_SIZE, RxRing};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Step(StepDirection),
    AllOff,
    Pump(bool),
}

// ── Load cell script ──────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct MockCell {
    pub ready: bool,
    pub raw: i32,
    pub scale: f32,
    pub offset: i32,
}

impl Default for MockCell {
    fn default() -> Self {
        Self {
            ready: true,
            raw: 0,
            scale: 1.0,
            offset: 0,
        }
    }
}

impl MockCell {
    /// Script a reading that converts to `grams` with the current calibration.
    pub fn show_grams(&mut self, grams: f32) {
        self.raw = self.offset + (grams * self.scale) as i32;
    }
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub food: MockCell,
    pub water: MockCell,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&mut self, channel: ScaleChannel) -> &mut MockCell {
        match channel {
            ScaleChannel::Food => &mut self.food,
            ScaleChannel::Water => &mut self.water,
        }
    }

    pub fn steps(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Step(_)))
            .count()
    }

    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::Pump(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn last_call(&self) -> Option<&ActuatorCall> {
        self.calls.last()
    }
}

impl ScalePort for MockHardware {
    fn data_ready(&mut self, channel: ScaleChannel) -> bool {
        self.cell(channel).ready
    }

    fn read_raw(&mut self, channel: ScaleChannel, _timeout: Duration) -> Result<i32, SensorError> {
        let cell = self.cell(channel);
        if cell.ready {
            Ok(cell.raw)
        } else {
            Err(SensorError::NotReady)
        }
    }

    fn read_mass(&mut self, channel: ScaleChannel, timeout: Duration) -> Result<f32, SensorError> {
        let raw = self.read_raw(channel, timeout)?;
        let cell = self.cell(channel);
        Ok((raw - cell.offset) as f32 / cell.scale)
    }

    fn set_scale(&mut self, channel: ScaleChannel, scale: f32) {
        if scale > 0.0 {
            self.cell(channel).scale = scale;
        }
    }

    fn set_offset(&mut self, channel: ScaleChannel, offset: i32) {
        self.cell(channel).offset = offset;
    }
}

impl ActuatorPort for MockHardware {
    fn step(&mut self, direction: StepDirection) {
        self.calls.push(ActuatorCall::Step(direction));
    }

    fn all_off(&mut self) {
        // Idle fast ticks release every time; keep the log readable.
        if self.calls.last() != Some(&ActuatorCall::AllOff) {
            self.calls.push(ActuatorCall::AllOff);
        }
    }

    fn steps_per_revolution(&self) -> u32 {
        4096
    }

    fn set_water_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Pump(on));
    }
}

// ── MockStorage ───────────────────────────────────────────────

pub struct MockStorage {
    pub image: Vec<u8>,
    /// Remaining init attempts that fail before one succeeds.
    pub init_failures: u8,
    pub init_calls: u8,
    pub fail_program: bool,
    pub programs: usize,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self {
            image: vec![0xFF; 256],
            init_failures: 0,
            init_calls: 0,
            fail_program: false,
            programs: 0,
        }
    }

    pub fn failing_init(times: u8) -> Self {
        Self {
            init_failures: times,
            ..Self::new()
        }
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStorage for MockStorage {
    fn init(&mut self) -> Result<(), StorageError> {
        self.init_calls += 1;
        if self.init_failures > 0 {
            self.init_failures -= 1;
            return Err(StorageError::NotReady);
        }
        Ok(())
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StorageError> {
        let start = usize::from(address);
        let src = self
            .image
            .get(start..start + buf.len())
            .ok_or(StorageError::OutOfRange)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn program(&mut self, address: u16, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_program {
            return Err(StorageError::IoError);
        }
        let start = usize::from(address);
        let dst = self
            .image
            .get_mut(start..start + data.len())
            .ok_or(StorageError::OutOfRange)?;
        dst.copy_from_slice(data);
        self.programs += 1;
        Ok(())
    }
}

// ── MockLink ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLink {
    pub lines: Vec<String>,
}

impl LinkPort for MockLink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

// ── LogSink ───────────────────────────────────────────────────

/// Collects emitted events for assertions.
#[derive(Default)]
pub struct LogSink {
    pub events: Vec<FeederEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&FeederEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &FeederEvent) {
        self.events.push(event.clone());
    }
}

// ── NoDelay ───────────────────────────────────────────────────

/// Records requested sleep time without sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A started service plus its mocks, driven with a simulated clock.
pub struct Rig {
    pub app: FeederService<MockStorage>,
    pub hw: MockHardware,
    pub link: MockLink,
    pub sink: LogSink,
    pub now: u32,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_storage(MockStorage::new())
    }

    pub fn with_storage(storage: MockStorage) -> Self {
        Self::with_parts(FeederConfig::default(), storage, MockHardware::new())
    }

    pub fn with_parts(config: FeederConfig, storage: MockStorage, mut hw: MockHardware) -> Self {
        let mut app = FeederService::new(config, storage, 0);
        let mut link = MockLink::default();
        let mut sink = LogSink::new();
        app.start(0, &mut hw, &mut link, &mut NoDelay::default(), &mut sink);
        Self {
            app,
            hw,
            link,
            sink,
            now: 0,
        }
    }

    /// Push raw bytes through a receive ring and return the lines answered.
    pub fn send_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut ring: RxRing<RX_RING_SIZE> = RxRing::new();
        let (mut producer, mut consumer) = ring.split();
        let mut answered = Vec::new();
        for chunk in bytes.chunks(RX_RING_SIZE - 1) {
            producer.push_slice(chunk);
            let before = self.link.lines.len();
            self.app.poll_serial(
                &mut consumer,
                self.now,
                &mut self.hw,
                &mut self.link,
                &mut self.sink,
            );
            answered.extend(self.link.lines[before..].iter().cloned());
        }
        answered
    }

    /// Send one command line and return its single response.
    pub fn send(&mut self, line: &str) -> String {
        let mut answered = self.send_bytes(format!("{line}\r\n").as_bytes());
        assert_eq!(answered.len(), 1, "expected one response to {line:?}");
        answered.remove(0)
    }

    /// Advance the clock in 10 ms steps, running each cadence when due in
    /// the same order as the firmware loop.
    pub fn advance(&mut self, ms: u32) {
        for _ in 0..ms / 10 {
            self.now = self.now.wrapping_add(10);
            self.app.tick_fast(self.now, &mut self.hw, &mut self.sink);
            if self.now % 100 == 0 {
                self.app.tick_sensors(self.now, &mut self.hw, &mut self.sink);
            }
            if self.now % 1000 == 0 {
                self.app
                    .tick_schedule(self.now, &mut self.hw, &mut self.link, &mut self.sink);
            }
        }
    }

    /// Advance until the dispenser goes idle (bounded).
    pub fn run_until_idle(&mut self) {
        for _ in 0..2_000 {
            if !self.app.is_busy() {
                return;
            }
            self.advance(10);
        }
        panic!("dispenser still busy");
    }
}
