//! Command line → response tests through the receive ring and framer.

use petfeeder::app::events::FeederEvent;
use petfeeder::app::ports::ScaleChannel;
use petfeeder::error::Alarm;
use petfeeder::protocol::GETTIME_REQUEST;

use crate::mock_hw::{MockStorage, Rig};

/// 2024-12-06 08:00:00 UTC.
const MORNING: u32 = 1_733_472_000;

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_requests_time_and_flags_clock_unset() {
    let rig = Rig::new();
    assert_eq!(rig.link.lines, [GETTIME_REQUEST]);
    assert!(rig.app.state().has(Alarm::ClockUnset));
    assert!(!rig.app.state().has(Alarm::StorageOffline));
    assert!(rig.app.resync_pending());
    assert!(rig.sink.events.contains(&FeederEvent::Started {
        storage_online: true
    }));
}

#[test]
fn status_before_settime_counts_from_epoch() {
    let mut rig = Rig::new();
    rig.now = 5_000;
    assert_eq!(
        rig.send("AT+STATUS"),
        "+OK: TIME=1970-01-01 00:00:05,BOWL=0,WATER=0,ALARM=4,BUSY=0"
    );
}

// ── SETTIME ───────────────────────────────────────────────────

#[test]
fn settime_anchors_the_clock() {
    let mut rig = Rig::new();
    rig.now = 5_000;
    assert_eq!(rig.send("AT+SETTIME=1733472000"), "+OK");
    assert!(!rig.app.state().has(Alarm::ClockUnset));
    assert!(!rig.app.resync_pending());

    rig.now = 6_000;
    let first = rig.send("AT+STATUS");
    rig.now = 7_000;
    let second = rig.send("AT+STATUS");
    assert!(first.starts_with("+OK: TIME=2024-12-06 08:00:01,"), "{first}");
    assert!(second.starts_with("+OK: TIME=2024-12-06 08:00:02,"), "{second}");
    assert!(first.ends_with("ALARM=0,BUSY=0"), "{first}");
}

#[test]
fn settime_rejects_zero_and_garbage() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("AT+SETTIME=0"), "+ERR: INVALID_TIMESTAMP");
    assert_eq!(rig.send("AT+SETTIME=soon"), "+ERR: INVALID_TIMESTAMP");
    assert!(rig.app.wall_clock(0).is_none());
}

#[test]
fn pending_resync_is_repeated_every_minute() {
    let mut rig = Rig::new();
    rig.advance(59_000);
    assert_eq!(rig.link.lines.len(), 1);
    rig.advance(1_000);
    assert_eq!(rig.link.lines, [GETTIME_REQUEST, GETTIME_REQUEST]);

    rig.send("AT+SETTIME=1733472000");
    rig.advance(120_000);
    let requests = rig
        .link
        .lines
        .iter()
        .filter(|l| l.as_str() == GETTIME_REQUEST)
        .count();
    assert_eq!(requests, 2, "no requests once the clock is set");
}

// ── FEED ──────────────────────────────────────────────────────

#[test]
fn feed_then_busy_then_idle() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("AT+FEED=L"), "+OK");
    assert!(rig.app.is_busy());
    assert_eq!(rig.send("AT+FEED=M"), "+ERR: BUSY");
    let status = rig.send("AT+STATUS");
    assert!(status.ends_with(",BUSY=1"), "{status}");

    rig.run_until_idle();
    assert_eq!(rig.hw.steps(), 341);
    assert_eq!(rig.send("AT+FEED=M"), "+OK");
}

#[test]
fn feed_validates_before_checking_busy() {
    let mut rig = Rig::new();
    rig.send("AT+FEED=H");
    assert_eq!(rig.send("AT+FEED=X"), "+ERR: PARAM_ERR");
    assert_eq!(rig.send("AT+FEED"), "+ERR: PARAM_ERR");
}

// ── LOG ───────────────────────────────────────────────────────

#[test]
fn log_before_anything_happened() {
    let mut rig = Rig::new();
    assert_eq!(
        rig.send("AT+LOG"),
        "+OK: FED_TIME=--:--,FED_AMT=0,EAT_TIME=--:--,EAT_AMT=0"
    );
}

#[test]
fn log_reports_last_feed() {
    let mut rig = Rig::new();
    rig.send(&format!("AT+SETTIME={MORNING}"));
    rig.send("AT+FEED=M");
    rig.run_until_idle();
    assert_eq!(
        rig.send("AT+LOG"),
        "+OK: FED_TIME=08:00,FED_AMT=25,EAT_TIME=--:--,EAT_AMT=0"
    );
}

#[test]
fn feed_without_clock_records_amount_only() {
    let mut rig = Rig::new();
    rig.send("AT+FEED=H");
    rig.run_until_idle();
    assert!(rig.send("AT+LOG").starts_with("+OK: FED_TIME=--:--,FED_AMT=40,"));
}

// ── TARE / CAL ────────────────────────────────────────────────

#[test]
fn tare_and_calibrate_food() {
    let mut rig = Rig::new();
    rig.hw.food.raw = 8_000;
    assert_eq!(rig.send("AT+TARE=FOOD"), "+OK");
    assert_eq!(rig.hw.food.offset, 8_000);

    rig.hw.food.raw = 8_000 + 21_000;
    assert_eq!(rig.send("AT+CAL=FOOD,500"), "+OK");
    assert_eq!(rig.hw.food.scale, 42.0);

    let cal = rig.app.state().calibration.channel(ScaleChannel::Food);
    assert_eq!((cal.offset, cal.scale), (8_000, 42.0));
    assert_eq!(
        rig.sink.count(|e| matches!(e, FeederEvent::RecordSaved { ok: true, .. })),
        2
    );
}

#[test]
fn tare_times_out_when_cell_silent() {
    let mut rig = Rig::new();
    rig.hw.water.ready = false;
    assert_eq!(rig.send("AT+TARE=WATER"), "+ERR: TIMEOUT");
    assert_eq!(rig.send("AT+CAL=WATER,100"), "+ERR: TIMEOUT");
}

#[test]
fn calibration_rejects_non_positive_scale() {
    let mut rig = Rig::new();
    rig.hw.food.raw = 500;
    rig.send("AT+TARE=FOOD");
    assert_eq!(rig.send("AT+CAL=FOOD,100"), "+ERR: CAL_ERR");
    rig.hw.food.raw = 100;
    assert_eq!(rig.send("AT+CAL=FOOD,100"), "+ERR: CAL_ERR");
    assert_eq!(rig.hw.food.scale, 1.0);
}

#[test]
fn calibration_param_errors() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("AT+CAL=FOOD,0"), "+ERR: PARAM_ERR");
    assert_eq!(rig.send("AT+CAL=FOOD"), "+ERR: PARAM_ERR");
    assert_eq!(rig.send("AT+TARE=LID"), "+ERR: PARAM_ERR");
}

// ── SCHED / GETSCHED ──────────────────────────────────────────

#[test]
fn schedule_round_trip_and_clear() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("AT+GETSCHED"), "+OK: NONE");
    assert_eq!(rig.send("AT+SCHED=0800M;1230L;1900H"), "+OK");
    assert_eq!(rig.send("AT+GETSCHED"), "+OK: 0800M;1230L;1900H");
    assert_eq!(rig.send("AT+SCHED=NONE"), "+OK");
    assert_eq!(rig.send("AT+GETSCHED"), "+OK: NONE");
    assert_eq!(rig.send("AT+SCHED="), "+ERR: PARAM_ERR");
}

#[test]
fn schedule_keeps_valid_entries_only() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("AT+SCHED=2500M;0700L;abc"), "+OK");
    assert_eq!(rig.send("AT+GETSCHED"), "+OK: 0700L");
}

// ── EEDIAG ────────────────────────────────────────────────────

#[test]
fn eediag_passes_on_fresh_and_written_storage() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("AT+EEDIAG"), "+OK: PASS");
    rig.send("AT+SCHED=0700L");
    assert_eq!(rig.send("AT+EEDIAG"), "+OK: PASS");
}

#[test]
fn eediag_fails_on_corruption() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0700L");
    rig.app.persistence_mut().storage_mut().image[0x1C + 5] ^= 0x01;
    assert_eq!(rig.send("AT+EEDIAG"), "+OK: FAIL");
}

#[test]
fn eediag_fails_when_storage_offline() {
    let mut rig = Rig::with_storage(MockStorage::failing_init(3));
    assert!(rig.app.state().has(Alarm::StorageOffline));
    assert_eq!(rig.send("AT+EEDIAG"), "+OK: FAIL");
}

// ── Framing and errors ────────────────────────────────────────

#[test]
fn unknown_and_markerless_lines() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("AT+REBOOT"), "+ERR: UNKNOWN_CMD");
    assert_eq!(rig.send("HELLO"), "+ERR: SYNTAX");
}

#[test]
fn leading_noise_before_marker_is_tolerated() {
    let mut rig = Rig::new();
    assert_eq!(rig.send("\x00\x7fAT+GETSCHED"), "+OK: NONE");
}

#[test]
fn several_lines_in_one_burst_get_answers_in_order() {
    let mut rig = Rig::new();
    let answers = rig.send_bytes(b"AT+GETSCHED\n\r\n\nAT+FEED=L\nAT+FEED=L\n");
    assert_eq!(answers, ["+OK: NONE", "+OK", "+ERR: BUSY"]);
}

#[test]
fn oversized_line_is_dropped_without_reply() {
    let mut rig = Rig::new();
    let mut burst = b"AT+SCHED=".to_vec();
    burst.extend_from_slice(&[b'1'; 300]);
    burst.extend_from_slice(b"\nAT+GETSCHED\n");
    assert_eq!(rig.send_bytes(&burst), ["+OK: NONE"]);
}
