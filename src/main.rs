//! PetFeeder Firmware — Main Entry Point
//!
//! Hexagonal architecture with a tick-flag driven control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FeederHardware    LogEventSink   NvsEeprom    UartLink        │
//! │  (Scale+Actuator)  (EventSink)    (Storage)    (LinkPort)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            FeederService (pure logic)                  │    │
//! │  │  Framer · Dispatcher · Scheduler · Sequencer · Store   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  1 kHz tick base (esp_timer) · UART reader task → RX ring      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use petfeeder::adapters::hardware::FeederHardware;
use petfeeder::adapters::log_sink::LogEventSink;
use petfeeder::adapters::nvs::NvsEeprom;
use petfeeder::adapters::time::TickClock;
use petfeeder::adapters::uart::{UartLink, spawn_reader};
use petfeeder::app::ports::MonotonicClock;
use petfeeder::app::service::FeederService;
use petfeeder::config::FeederConfig;
use petfeeder::drivers::hw_init::{self, GpioInput, GpioOutput};
use petfeeder::drivers::pump::WaterPump;
use petfeeder::drivers::stepper::Uln2003;
use petfeeder::drivers::hw_timer;
use petfeeder::drivers::watchdog::{self, LoopWatchdog};
use petfeeder::events::{self, Cadence};
use petfeeder::pins;
use petfeeder::sensors::ScaleHub;
use petfeeder::sensors::hx711::Hx711;
use petfeeder::serial::{RX_RING_SIZE, RxRing};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PetFeeder v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = FeederConfig::default();
    if let Err(e) = config.validate() {
        anyhow::bail!("built-in config invalid: {}", e);
    }

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // The watchdog is not yet armed, so park instead of spinning.
        error!("HAL init failed: {} — halting", e);
        loop {
            FreeRtos::delay_ms(1000);
        }
    }
    events::configure(
        config.fast_tick_ms,
        config.sensor_tick_ms,
        config.schedule_tick_ms,
    );
    hw_timer::start_timers();

    // ── 3. Companion link ─────────────────────────────────────
    // The HAL wants typed pins here; keep in step with pins::UART_*_GPIO.
    let peripherals = Peripherals::take()?;
    let uart_config = uart::config::Config::new().baudrate(Hertz(config.uart_baud));
    let link_uart = uart::UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        AnyInputPin::none(),
        AnyOutputPin::none(),
        &uart_config,
    )?;
    let (uart_tx, uart_rx) = link_uart.into_split();
    info!(
        "Link: UART1 tx=GPIO{} rx=GPIO{} @ {} baud",
        pins::UART_TX_GPIO,
        pins::UART_RX_GPIO,
        config.uart_baud
    );

    let ring: &'static mut RxRing<RX_RING_SIZE> = Box::leak(Box::new(RxRing::new()));
    let (producer, mut rx) = ring.split();
    let _reader = spawn_reader(uart_rx, producer)?;
    let mut link = UartLink::new(uart_tx);

    // ── 4. Construct adapters ─────────────────────────────────
    let scales = ScaleHub::new(
        Hx711::new(
            GpioInput::new(pins::HX711_FOOD_DOUT_GPIO),
            GpioOutput::new(pins::HX711_FOOD_SCK_GPIO),
            Ets,
        ),
        Hx711::new(
            GpioInput::new(pins::HX711_WATER_DOUT_GPIO),
            GpioOutput::new(pins::HX711_WATER_SCK_GPIO),
            Ets,
        ),
    );
    let stepper = Uln2003::new(
        GpioOutput::new(pins::STEPPER_IN1_GPIO),
        GpioOutput::new(pins::STEPPER_IN2_GPIO),
        GpioOutput::new(pins::STEPPER_IN3_GPIO),
        GpioOutput::new(pins::STEPPER_IN4_GPIO),
    );
    let pump = WaterPump::new(GpioOutput::new(pins::WATER_PUMP_GPIO));
    let mut hw = FeederHardware::new(scales, stepper, pump);
    let mut log_sink = LogEventSink::new();
    let clock = TickClock::new();

    // ── 5. Construct app service ──────────────────────────────
    let mut app = FeederService::new(config, NvsEeprom::new(), clock.now_ms());
    app.start(clock.now_ms(), &mut hw, &mut link, &mut FreeRtos, &mut log_sink);

    hw.stepper_mut().self_test(&mut FreeRtos);

    let mut watchdog = LoopWatchdog::arm(watchdog::DEFAULT_TIMEOUT_MS);
    let mut reported_drops = 0;
    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        let now = clock.now_ms();

        app.poll_serial(&mut rx, now, &mut hw, &mut link, &mut log_sink);

        if events::take(Cadence::Fast) {
            app.tick_fast(clock.now_ms(), &mut hw, &mut log_sink);
        }
        if events::take(Cadence::Sensor) {
            app.tick_sensors(clock.now_ms(), &mut hw, &mut log_sink);
        }
        if events::take(Cadence::Schedule) {
            app.tick_schedule(clock.now_ms(), &mut hw, &mut link, &mut log_sink);
            let dropped = rx.dropped();
            if dropped != reported_drops {
                warn!("Link: {} RX bytes dropped since boot", dropped);
                reported_drops = dropped;
            }
        }

        watchdog.feed(clock.now_ms());

        // Yield to the reader and idle tasks.
        FreeRtos::delay_ms(1);
    }
}
