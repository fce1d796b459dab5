//! Fixed-layout persisted records.
//!
//! Both records are little-endian, start with a magic sentinel and carry a
//! CRC-32 (ISO-HDLC) over every byte that precedes the CRC field.
//!
//! ```text
//! calibration @ 0x0000 (28 bytes)
//!   0  magic        u32  0x48583731
//!   4  food_scale   f32
//!   8  food_offset  i32
//!  12  water_scale  f32
//!  16  water_offset i32
//!  20  crc32        u32  over [0..20)
//!  24  reserved     u32  0
//!
//! schedule @ 0x001C (44 bytes)
//!   0  magic        u32  0x53434844
//!   4  count        u32  0..=8
//!   8  slots        8 x { hour u8, minute u8, amount ASCII, enable u8 }
//!  40  crc32        u32  over [0..40)
//! ```
//!
//! The per-slot enable byte is no longer part of the model; it is written
//! as 1 and ignored on load so the layout stays readable by older firmware.

use crc::{CRC_32_ISO_HDLC, Crc};

use crate::app::ports::ScaleChannel;
use crate::scheduler::{Amount, MAX_ENTRIES, ScheduleEntry, ScheduleTable};

pub const CALIBRATION_ADDR: u16 = 0x0000;
pub const CALIBRATION_LEN: usize = 28;
pub const CALIBRATION_MAGIC: u32 = 0x4858_3731;

pub const SCHEDULE_ADDR: u16 = 0x001C;
pub const SCHEDULE_LEN: usize = 44;
pub const SCHEDULE_MAGIC: u32 = 0x5343_4844;

const CAL_CRC_AT: usize = 20;
const SCHED_SLOTS_AT: usize = 8;
const SCHED_CRC_AT: usize = 40;
const SLOT_LEN: usize = 4;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Why a stored image was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// Never written (erased or zeroed).
    Blank,
    BadMagic,
    BadChecksum,
    /// Checksum fine but a field is out of range.
    InvalidPayload,
}

impl core::fmt::Display for RecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Blank => write!(f, "blank record"),
            Self::BadMagic => write!(f, "bad magic"),
            Self::BadChecksum => write!(f, "checksum mismatch"),
            Self::InvalidPayload => write!(f, "invalid payload"),
        }
    }
}

// ── Calibration ───────────────────────────────────────────────

/// Per-cell calibration: `grams = (raw - offset) / scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelCalibration {
    /// Counts per gram.  Always finite and positive.
    pub scale: f32,
    /// Raw reading at zero load.
    pub offset: i32,
}

impl Default for ChannelCalibration {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub food: ChannelCalibration,
    pub water: ChannelCalibration,
}

impl Calibration {
    pub fn channel(&self, channel: ScaleChannel) -> &ChannelCalibration {
        match channel {
            ScaleChannel::Food => &self.food,
            ScaleChannel::Water => &self.water,
        }
    }

    pub fn channel_mut(&mut self, channel: ScaleChannel) -> &mut ChannelCalibration {
        match channel {
            ScaleChannel::Food => &mut self.food,
            ScaleChannel::Water => &mut self.water,
        }
    }

    pub fn encode(&self) -> [u8; CALIBRATION_LEN] {
        let mut out = [0u8; CALIBRATION_LEN];
        put_u32(&mut out, 0, CALIBRATION_MAGIC);
        put_u32(&mut out, 4, self.food.scale.to_bits());
        put_u32(&mut out, 8, self.food.offset as u32);
        put_u32(&mut out, 12, self.water.scale.to_bits());
        put_u32(&mut out, 16, self.water.offset as u32);
        let crc = CRC32.checksum(&out[..CAL_CRC_AT]);
        put_u32(&mut out, CAL_CRC_AT, crc);
        // reserved stays 0
        out
    }

    pub fn decode(image: &[u8; CALIBRATION_LEN]) -> Result<Self, RecordError> {
        check_frame(image, CALIBRATION_MAGIC, CAL_CRC_AT)?;

        let food = ChannelCalibration {
            scale: f32::from_bits(get_u32(image, 4)),
            offset: get_u32(image, 8) as i32,
        };
        let water = ChannelCalibration {
            scale: f32::from_bits(get_u32(image, 12)),
            offset: get_u32(image, 16) as i32,
        };
        if !valid_scale(food.scale) || !valid_scale(water.scale) {
            return Err(RecordError::InvalidPayload);
        }
        Ok(Self { food, water })
    }
}

fn valid_scale(scale: f32) -> bool {
    scale.is_finite() && scale > 0.0
}

// ── Schedule ──────────────────────────────────────────────────

pub fn encode_schedule(entries: &[ScheduleEntry]) -> [u8; SCHEDULE_LEN] {
    let mut out = [0u8; SCHEDULE_LEN];
    let count = entries.len().min(MAX_ENTRIES);
    put_u32(&mut out, 0, SCHEDULE_MAGIC);
    put_u32(&mut out, 4, count as u32);
    for (i, entry) in entries.iter().take(count).enumerate() {
        let at = SCHED_SLOTS_AT + i * SLOT_LEN;
        out[at] = entry.hour();
        out[at + 1] = entry.minute();
        out[at + 2] = entry.amount().code();
        out[at + 3] = 1;
    }
    let crc = CRC32.checksum(&out[..SCHED_CRC_AT]);
    put_u32(&mut out, SCHED_CRC_AT, crc);
    out
}

pub fn decode_schedule(image: &[u8; SCHEDULE_LEN]) -> Result<ScheduleTable, RecordError> {
    check_frame(image, SCHEDULE_MAGIC, SCHED_CRC_AT)?;

    let count = get_u32(image, 4) as usize;
    if count > MAX_ENTRIES {
        return Err(RecordError::InvalidPayload);
    }

    let mut table = ScheduleTable::new();
    for i in 0..count {
        let at = SCHED_SLOTS_AT + i * SLOT_LEN;
        let entry = Amount::from_code(image[at + 2])
            .and_then(|amount| ScheduleEntry::new(image[at], image[at + 1], amount))
            .ok_or(RecordError::InvalidPayload)?;
        table
            .push(entry)
            .map_err(|_| RecordError::InvalidPayload)?;
    }
    Ok(table)
}

// ── Framing helpers ───────────────────────────────────────────

/// `true` for an erased (0xFF) or zeroed image.
pub fn is_blank(image: &[u8]) -> bool {
    image.iter().all(|&b| b == 0xFF) || image.iter().all(|&b| b == 0x00)
}

fn check_frame(image: &[u8], magic: u32, crc_at: usize) -> Result<(), RecordError> {
    if is_blank(image) {
        return Err(RecordError::Blank);
    }
    if get_u32(image, 0) != magic {
        return Err(RecordError::BadMagic);
    }
    if get_u32(image, crc_at) != CRC32.checksum(&image[..crc_at]) {
        return Err(RecordError::BadChecksum);
    }
    Ok(())
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
