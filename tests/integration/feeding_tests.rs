//! Dispense, schedule and load-cell behaviour over simulated time.

use petfeeder::app::events::{FeedSource, FeederEvent};
use petfeeder::config::FeederConfig;
use petfeeder::error::Alarm;
use petfeeder::scheduler::Amount;

use crate::mock_hw::{ActuatorCall, MockHardware, MockStorage, Rig};

/// 2024-12-06 08:00:00 UTC.
const MORNING: u32 = 1_733_472_000;

fn rig_with(config: FeederConfig) -> Rig {
    Rig::with_parts(config, MockStorage::new(), MockHardware::new())
}

fn feeds_started(rig: &Rig, source: FeedSource) -> usize {
    rig.sink
        .count(|e| matches!(e, FeederEvent::FeedStarted { source: s, .. } if *s == source))
}

// ── Manual dispense ───────────────────────────────────────────

#[test]
fn low_portion_turns_auger_and_logs_amount() {
    let mut rig = Rig::new();
    rig.send("AT+FEED=L");
    rig.run_until_idle();

    assert_eq!(rig.hw.steps(), 341);
    assert_eq!(rig.hw.last_call(), Some(&ActuatorCall::AllOff));
    assert!(rig.sink.events.contains(&FeederEvent::FeedCompleted {
        amount: Amount::Low,
        grams: 10,
        forced: false
    }));
    assert!(rig.send("AT+LOG").contains("FED_AMT=10,"));
}

#[test]
fn portion_sizes_scale_with_amount() {
    let mut rig = Rig::new();
    rig.send("AT+FEED=M");
    rig.run_until_idle();
    assert_eq!(rig.hw.steps(), 683);

    rig.send("AT+FEED=H");
    rig.run_until_idle();
    assert_eq!(rig.hw.steps(), 683 + 1365);
    assert!(rig.send("AT+LOG").contains("FED_AMT=40,"));
}

#[test]
fn slow_auger_trips_deadline_and_raises_jam() {
    // Pulses are due every 5 ms but the fast tick only comes every 10 ms,
    // so the dispense overruns its budget.
    let mut rig = rig_with(FeederConfig {
        step_delay_ms: 5,
        ..Default::default()
    });
    rig.send("AT+FEED=L");
    rig.run_until_idle();

    assert!(rig.hw.steps() < 341);
    assert!(rig.app.state().has(Alarm::FeedJam));
    assert!(rig.sink.events.contains(&FeederEvent::FeedCompleted {
        amount: Amount::Low,
        grams: 10,
        forced: true
    }));
    assert!(rig.send("AT+LOG").contains("FED_AMT=10,"));
}

#[test]
fn jam_alarm_clears_after_clean_dispense() {
    let mut rig = rig_with(FeederConfig {
        step_delay_ms: 5,
        deadline_margin_ms: 2000,
        ..Default::default()
    });
    rig.send("AT+FEED=H");
    rig.run_until_idle();
    assert!(rig.app.state().has(Alarm::FeedJam));

    rig.send("AT+FEED=L");
    rig.run_until_idle();
    assert!(!rig.app.state().has(Alarm::FeedJam));
}

#[test]
fn oversize_task_is_aborted_without_snapshot() {
    let mut rig = rig_with(FeederConfig {
        max_feed_steps: 100,
        ..Default::default()
    });
    assert_eq!(rig.send("AT+FEED=L"), "+OK");
    rig.advance(10);

    assert!(!rig.app.is_busy());
    assert_eq!(rig.hw.steps(), 0);
    assert!(rig.sink.events.contains(&FeederEvent::FeedAborted {
        steps_remaining: 341
    }));
    assert!(rig.send("AT+LOG").contains("FED_AMT=0,"));
}

// ── Scheduler ─────────────────────────────────────────────────

#[test]
fn scheduled_slot_fires_once() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0800M");
    rig.send(&format!("AT+SETTIME={}", MORNING - 30));

    rig.advance(29_000);
    assert_eq!(feeds_started(&rig, FeedSource::Scheduled), 0);
    rig.advance(1_000);
    assert_eq!(feeds_started(&rig, FeedSource::Scheduled), 1);

    rig.run_until_idle();
    rig.advance(90_000);
    assert_eq!(feeds_started(&rig, FeedSource::Scheduled), 1);
    assert_eq!(rig.hw.steps(), 683);
    assert_eq!(
        rig.send("AT+LOG"),
        "+OK: FED_TIME=08:00,FED_AMT=25,EAT_TIME=--:--,EAT_AMT=0"
    );
}

#[test]
fn settime_inside_slot_minute_does_not_fire() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0800L");
    rig.send(&format!("AT+SETTIME={}", MORNING + 5));
    rig.advance(50_000);
    assert_eq!(feeds_started(&rig, FeedSource::Scheduled), 0);
}

#[test]
fn slot_due_while_busy_is_skipped() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0800L");
    rig.send(&format!("AT+SETTIME={}", MORNING - 2));
    rig.send("AT+FEED=H");

    rig.advance(2_000);
    assert!(rig.sink.events.contains(&FeederEvent::ScheduleSkipped {
        hour: 8,
        minute: 0
    }));
    rig.run_until_idle();
    rig.advance(60_000);
    assert_eq!(feeds_started(&rig, FeedSource::Scheduled), 0);
    assert_eq!(rig.hw.steps(), 1365);
}

#[test]
fn nothing_fires_while_clock_unset() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0000L;0001L;0002L");
    rig.advance(180_000);
    assert_eq!(feeds_started(&rig, FeedSource::Scheduled), 0);
    assert_eq!(rig.hw.steps(), 0);
}

// ── Load cells ────────────────────────────────────────────────

#[test]
fn low_reservoir_runs_pump_until_refilled() {
    let mut rig = Rig::new();
    rig.hw.water.show_grams(50.0);
    rig.advance(100);
    assert!(rig.hw.pump_on());
    assert!(rig.app.state().has(Alarm::WaterLow));
    let status = rig.send("AT+STATUS");
    assert!(status.ends_with(",WATER=50,ALARM=5,BUSY=0"), "{status}");

    rig.hw.water.show_grams(120.0);
    rig.advance(100);
    assert!(!rig.hw.pump_on());
    assert!(!rig.app.state().has(Alarm::WaterLow));
    assert_eq!(
        rig.sink.count(|e| matches!(e, FeederEvent::PumpChanged { .. })),
        2
    );
}

#[test]
fn threshold_itself_is_not_low() {
    let mut rig = Rig::new();
    rig.hw.water.show_grams(80.0);
    rig.advance(300);
    assert!(!rig.hw.pump_on());
    assert!(!rig.app.state().has(Alarm::WaterLow));
}

#[test]
fn silent_cell_keeps_last_reading() {
    let mut rig = Rig::new();
    rig.hw.water.show_grams(150.0);
    rig.advance(100);
    rig.hw.water.ready = false;
    rig.hw.water.show_grams(10.0);
    rig.advance(500);
    assert_eq!(rig.app.state().water_g, 150);
    assert!(!rig.hw.pump_on());
}

#[test]
fn bowl_reading_uses_calibration() {
    let mut rig = Rig::new();
    rig.hw.food.offset = 1_000;
    rig.hw.food.scale = 20.0;
    rig.hw.food.show_grams(37.4);
    rig.advance(100);
    assert_eq!(rig.app.state().bowl_g, 37);
}

#[test]
fn bowl_drop_is_logged_as_meal() {
    let mut rig = Rig::new();
    rig.send(&format!("AT+SETTIME={MORNING}"));
    rig.hw.food.show_grams(50.0);
    rig.advance(200);
    rig.hw.food.show_grams(42.0);
    rig.advance(100);

    assert!(rig.sink.events.contains(&FeederEvent::EatDetected { grams: 8 }));
    assert_eq!(
        rig.send("AT+LOG"),
        "+OK: FED_TIME=--:--,FED_AMT=0,EAT_TIME=08:00,EAT_AMT=8"
    );
}

#[test]
fn bowl_jitter_is_not_a_meal() {
    let mut rig = Rig::new();
    rig.hw.food.show_grams(50.0);
    rig.advance(200);
    rig.hw.food.show_grams(48.0);
    rig.advance(200);
    rig.hw.food.show_grams(51.0);
    rig.advance(200);
    assert_eq!(
        rig.sink.count(|e| matches!(e, FeederEvent::EatDetected { .. })),
        0
    );
}

#[test]
fn bowl_changes_during_dispense_are_ignored() {
    let mut rig = Rig::new();
    rig.hw.food.show_grams(50.0);
    rig.advance(200);
    rig.send("AT+FEED=L");
    rig.hw.food.show_grams(30.0);
    rig.run_until_idle();
    rig.advance(500);
    assert_eq!(
        rig.sink.count(|e| matches!(e, FeederEvent::EatDetected { .. })),
        0
    );
}
