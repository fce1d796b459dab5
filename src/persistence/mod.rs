//! Persistence gateway — calibration and schedule records on block storage.
//!
//! The gateway owns the [`BlockStorage`] backend.  If every init attempt
//! fails it stays offline for the rest of the session and every load/save
//! fails fast with [`PersistError::Offline`]; the firmware keeps running on
//! in-memory defaults.
//!
//! Loads never partially apply: a record is returned only if magic, CRC and
//! payload all validate.

pub mod record;

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{BlockStorage, StorageError};
use crate::scheduler::{ScheduleEntry, ScheduleTable};

pub use record::{Calibration, ChannelCalibration, RecordError};
use record::{
    CALIBRATION_ADDR, CALIBRATION_LEN, SCHEDULE_ADDR, SCHEDULE_LEN, decode_schedule,
    encode_schedule,
};

/// Errors from gateway loads and saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    /// Storage never came up.
    Offline,
    /// Backend read/program failed.
    Storage(StorageError),
    /// Stored image rejected.
    Record(RecordError),
}

impl core::fmt::Display for PersistError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Offline => write!(f, "storage offline"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Record(e) => write!(f, "record: {e}"),
        }
    }
}

impl From<StorageError> for PersistError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<RecordError> for PersistError {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

pub struct PersistenceGateway<S> {
    storage: S,
    online: bool,
}

impl<S: BlockStorage> PersistenceGateway<S> {
    /// Wrap a backend.  Offline until [`init_with_retry`](Self::init_with_retry).
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            online: false,
        }
    }

    /// Try to bring storage up, sleeping `backoff` between attempts.
    /// Returns whether storage is online.
    pub fn init_with_retry(
        &mut self,
        attempts: u8,
        backoff: Duration,
        delay: &mut impl DelayNs,
    ) -> bool {
        for attempt in 1..=attempts {
            match self.storage.init() {
                Ok(()) => {
                    info!("Persistence: storage online (attempt {})", attempt);
                    self.online = true;
                    return true;
                }
                Err(e) => {
                    warn!("Persistence: init attempt {}/{} failed: {}", attempt, attempts, e);
                    if attempt < attempts {
                        delay.delay_ms(backoff.as_millis() as u32);
                    }
                }
            }
        }
        warn!("Persistence: running without storage");
        self.online = false;
        false
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn load_calibration(&mut self) -> Result<Calibration, PersistError> {
        let mut image = [0u8; CALIBRATION_LEN];
        self.read(CALIBRATION_ADDR, &mut image)?;
        let cal = Calibration::decode(&image)?;
        debug!("Persistence: calibration record valid");
        Ok(cal)
    }

    pub fn save_calibration(&mut self, calibration: &Calibration) -> Result<(), PersistError> {
        self.program(CALIBRATION_ADDR, &calibration.encode())
    }

    pub fn load_schedule(&mut self) -> Result<ScheduleTable, PersistError> {
        let mut image = [0u8; SCHEDULE_LEN];
        self.read(SCHEDULE_ADDR, &mut image)?;
        let table = decode_schedule(&image)?;
        debug!("Persistence: schedule record valid ({} entries)", table.len());
        Ok(table)
    }

    pub fn save_schedule(&mut self, entries: &[ScheduleEntry]) -> Result<(), PersistError> {
        self.program(SCHEDULE_ADDR, &encode_schedule(entries))
    }

    /// Integrity check for EEDIAG: storage online and each record either
    /// valid or never written.
    pub fn check_integrity(&mut self) -> bool {
        if !self.online {
            return false;
        }
        let calibration = accept_blank(self.load_calibration());
        let schedule = accept_blank(self.load_schedule());
        if !calibration || !schedule {
            warn!(
                "Persistence: integrity check failed (calibration={}, schedule={})",
                calibration, schedule
            );
        }
        calibration && schedule
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), PersistError> {
        if !self.online {
            return Err(PersistError::Offline);
        }
        self.storage.read(address, buf)?;
        Ok(())
    }

    fn program(&mut self, address: u16, data: &[u8]) -> Result<(), PersistError> {
        if !self.online {
            return Err(PersistError::Offline);
        }
        self.storage.program(address, data)?;
        Ok(())
    }
}

fn accept_blank<T>(result: Result<T, PersistError>) -> bool {
    matches!(result, Ok(_) | Err(PersistError::Record(RecordError::Blank)))
}
