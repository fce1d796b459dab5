//! Records surviving restarts, corruption handling and storage faults.

use petfeeder::app::events::FeederEvent;
use petfeeder::config::FeederConfig;
use petfeeder::error::Alarm;
use petfeeder::persistence::record::{CALIBRATION_ADDR, SCHEDULE_ADDR};

use crate::mock_hw::{MockHardware, MockStorage, Rig};

/// Restart with the storage image left behind by `rig`.
fn reboot(rig: &Rig) -> Rig {
    let storage = MockStorage {
        image: rig.app.persistence().storage().image.clone(),
        ..MockStorage::new()
    };
    Rig::with_parts(FeederConfig::default(), storage, MockHardware::new())
}

// ── Restart ───────────────────────────────────────────────────

#[test]
fn calibration_survives_restart() {
    let mut rig = Rig::new();
    rig.hw.water.raw = -2_000;
    rig.send("AT+TARE=WATER");
    rig.hw.water.raw = -2_000 + 10_500;
    assert_eq!(rig.send("AT+CAL=WATER,250"), "+OK");

    let rebooted = reboot(&rig);
    assert!(rebooted.sink.events.contains(&FeederEvent::RecordsLoaded {
        calibration: true,
        schedule: false
    }));
    assert_eq!(rebooted.hw.water.offset, -2_000);
    assert_eq!(rebooted.hw.water.scale, 42.0);
    assert_eq!(rebooted.hw.food.scale, 1.0);
}

#[test]
fn schedule_survives_restart() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0630L;1800H");

    let mut rebooted = reboot(&rig);
    assert!(rebooted.sink.events.contains(&FeederEvent::RecordsLoaded {
        calibration: false,
        schedule: true
    }));
    assert_eq!(rebooted.send("AT+GETSCHED"), "+OK: 0630L;1800H");
}

#[test]
fn cleared_schedule_stays_cleared() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0630L");
    rig.send("AT+SCHED=NONE");
    assert_eq!(reboot(&rig).send("AT+GETSCHED"), "+OK: NONE");
}

#[test]
fn schedule_record_layout() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0800M");
    let image = &rig.app.persistence().storage().image;
    let at = usize::from(SCHEDULE_ADDR);
    assert_eq!(&image[at..at + 4], &[0x44, 0x48, 0x43, 0x53]);
    assert_eq!(&image[at + 4..at + 8], &[1, 0, 0, 0]);
    assert_eq!(&image[at + 8..at + 12], &[8, 0, b'M', 1]);
    assert!(image[..usize::from(CALIBRATION_ADDR) + 28].iter().all(|&b| b == 0xFF));
}

// ── Corruption ────────────────────────────────────────────────

#[test]
fn corrupt_calibration_falls_back_to_defaults() {
    let mut rig = Rig::new();
    rig.hw.food.raw = 4_200;
    rig.send("AT+CAL=FOOD,100");
    rig.send("AT+SCHED=0700L");
    rig.app.persistence_mut().storage_mut().image[usize::from(CALIBRATION_ADDR) + 4] ^= 0xA5;

    let mut rebooted = reboot(&rig);
    assert!(rebooted.sink.events.contains(&FeederEvent::RecordsLoaded {
        calibration: false,
        schedule: true
    }));
    assert_eq!(rebooted.hw.food.scale, 1.0);
    assert_eq!(rebooted.app.state().calibration.food.scale, 1.0);
    assert_eq!(rebooted.send("AT+EEDIAG"), "+OK: FAIL");
}

#[test]
fn oversized_schedule_count_is_rejected() {
    let mut rig = Rig::new();
    rig.send("AT+SCHED=0700L");
    // A count past the table capacity with a matching CRC is still invalid.
    let image = &mut rig.app.persistence_mut().storage_mut().image;
    let at = usize::from(SCHEDULE_ADDR);
    image[at + 4] = 9;
    let crc = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(&image[at..at + 40]);
    image[at + 40..at + 44].copy_from_slice(&crc.to_le_bytes());

    let mut rebooted = reboot(&rig);
    assert_eq!(rebooted.send("AT+GETSCHED"), "+OK: NONE");
}

// ── Storage faults ────────────────────────────────────────────

#[test]
fn storage_init_is_retried() {
    let rig = Rig::with_storage(MockStorage::failing_init(2));
    assert_eq!(rig.app.persistence().storage().init_calls, 3);
    assert!(rig.app.persistence().is_online());
    assert!(!rig.app.state().has(Alarm::StorageOffline));
}

#[test]
fn offline_storage_keeps_commands_working_in_ram() {
    let mut rig = Rig::with_storage(MockStorage::failing_init(10));
    assert_eq!(rig.app.persistence().storage().init_calls, 3);
    assert!(rig.sink.events.contains(&FeederEvent::Started {
        storage_online: false
    }));
    assert_eq!(
        rig.sink.count(|e| matches!(e, FeederEvent::RecordsLoaded { .. })),
        0
    );

    rig.now = 1_000;
    let status = rig.send("AT+STATUS");
    assert!(status.ends_with(",ALARM=12,BUSY=0"), "{status}");

    assert_eq!(rig.send("AT+SCHED=0900H"), "+OK");
    assert_eq!(rig.send("AT+GETSCHED"), "+OK: 0900H");
    assert!(rig.sink.events.contains(&FeederEvent::RecordSaved {
        record: "schedule",
        ok: false
    }));
    assert_eq!(rig.app.persistence().storage().programs, 0);
}

#[test]
fn failed_write_is_reported_but_applied() {
    let storage = MockStorage {
        fail_program: true,
        ..MockStorage::new()
    };
    let mut rig = Rig::with_storage(storage);
    rig.hw.food.raw = 300;
    assert_eq!(rig.send("AT+TARE=FOOD"), "+OK");
    assert_eq!(rig.app.state().calibration.food.offset, 300);
    assert!(rig.sink.events.contains(&FeederEvent::RecordSaved {
        record: "calibration",
        ok: false
    }));
    assert_eq!(rig.send("AT+EEDIAG"), "+OK: PASS");
}
