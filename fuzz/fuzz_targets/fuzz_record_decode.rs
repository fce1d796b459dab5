//! Fuzz target: persisted record decoding
//!
//! Decodes arbitrary images as calibration and schedule records.  Anything
//! that decodes must satisfy the record invariants and survive another
//! encode/decode pass unchanged.
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::persistence::record::{
    CALIBRATION_LEN, Calibration, SCHEDULE_LEN, decode_schedule, encode_schedule,
};

fuzz_target!(|data: &[u8]| {
    if let Some(image) = data.get(..CALIBRATION_LEN) {
        let mut buf = [0u8; CALIBRATION_LEN];
        buf.copy_from_slice(image);
        if let Ok(cal) = Calibration::decode(&buf) {
            assert!(cal.food.scale.is_finite() && cal.food.scale > 0.0);
            assert!(cal.water.scale.is_finite() && cal.water.scale > 0.0);
            assert_eq!(Calibration::decode(&cal.encode()), Ok(cal));
        }
    }

    if let Some(image) = data.get(..SCHEDULE_LEN) {
        let mut buf = [0u8; SCHEDULE_LEN];
        buf.copy_from_slice(image);
        if let Ok(table) = decode_schedule(&buf) {
            assert_eq!(decode_schedule(&encode_schedule(&table)), Ok(table));
        }
    }
});
