//! NVS-backed emulated EEPROM.
//!
//! Implements [`BlockStorage`] as a small byte-addressable image.  The
//! whole image lives in one NVS blob; every `program` rewrites the blob and
//! commits, so a power cut leaves either the old or the new image.
//!
//! - **`target_os = "espidf"`** — ESP-IDF NVS, namespace `petfeeder`.
//! - **otherwise** — in-memory image for host tests and simulation.

use log::info;

#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{BlockStorage, StorageError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Emulated EEPROM size in bytes.
pub const EEPROM_SIZE: usize = 256;

/// Erased-cell value.
const ERASED: u8 = 0xFF;

#[cfg(target_os = "espidf")]
const NAMESPACE: &[u8] = b"petfeeder\0";
#[cfg(target_os = "espidf")]
const IMAGE_KEY: &[u8] = b"eeprom\0";

pub struct NvsEeprom {
    image: [u8; EEPROM_SIZE],
    ready: bool,
}

impl Default for NvsEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl NvsEeprom {
    /// Not usable until [`BlockStorage::init`] succeeds.
    pub const fn new() -> Self {
        Self {
            image: [ERASED; EEPROM_SIZE],
            ready: false,
        }
    }

    fn check_range(address: u16, len: usize) -> Result<core::ops::Range<usize>, StorageError> {
        let start = usize::from(address);
        let end = start.checked_add(len).ok_or(StorageError::OutOfRange)?;
        if end > EEPROM_SIZE {
            return Err(StorageError::OutOfRange);
        }
        Ok(start..end)
    }

    /// Open the namespace, run `f`, close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: NAMESPACE is NUL-terminated; handle is a valid out-pointer.
        let ret = unsafe { nvs_open(NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: handle was opened above and is closed exactly once.
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn init_backend(&mut self) -> Result<(), StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(StorageError::NotReady);
            }
        } else if ret != ESP_OK {
            return Err(StorageError::NotReady);
        }

        let image = &mut self.image;
        let loaded = Self::with_nvs_handle(false, |handle| {
            let mut size = EEPROM_SIZE;
            // SAFETY: image is EEPROM_SIZE bytes; size tells NVS the capacity.
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    IMAGE_KEY.as_ptr() as *const _,
                    image.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });

        match loaded {
            Ok(size) => info!("NvsEeprom: loaded {} byte image", size),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                self.image = [ERASED; EEPROM_SIZE];
                info!("NvsEeprom: no image yet, starting erased");
            }
            Err(e) => {
                warn!("NvsEeprom: image read failed ({})", e);
                return Err(StorageError::IoError);
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn init_backend(&mut self) -> Result<(), StorageError> {
        info!("NvsEeprom: simulation backend");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn flush(&self) -> Result<(), StorageError> {
        let image = &self.image;
        Self::with_nvs_handle(true, |handle| {
            // SAFETY: image is a valid EEPROM_SIZE-byte buffer.
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    IMAGE_KEY.as_ptr() as *const _,
                    image.as_ptr() as *const _,
                    EEPROM_SIZE,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            // SAFETY: handle is open read-write.
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsEeprom: commit failed ({})", e);
            StorageError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl BlockStorage for NvsEeprom {
    fn init(&mut self) -> Result<(), StorageError> {
        self.init_backend()?;
        self.ready = true;
        Ok(())
    }

    fn read(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StorageError> {
        if !self.ready {
            return Err(StorageError::NotReady);
        }
        let range = Self::check_range(address, buf.len())?;
        buf.copy_from_slice(&self.image[range]);
        Ok(())
    }

    fn program(&mut self, address: u16, data: &[u8]) -> Result<(), StorageError> {
        if !self.ready {
            return Err(StorageError::NotReady);
        }
        let range = Self::check_range(address, data.len())?;
        let previous = self.image;
        self.image[range].copy_from_slice(data);
        if let Err(e) = self.flush() {
            self.image = previous;
            return Err(e);
        }
        Ok(())
    }
}
