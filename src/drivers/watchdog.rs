//! Control-loop watchdog.
//!
//! Subscribes the control-loop task to the ESP-IDF Task Watchdog (TWDT) so
//! a stalled loop resets the device.  The timeout has to cover the longest
//! blocking path of one pass: a TARE/CAL read at its full sensor timeout
//! followed by a storage write.
//!
//! Besides kicking the TWDT, [`LoopWatchdog::feed`] tracks the longest gap
//! between passes and warns once a pass has used more than half the budget,
//! so slow paths show up in the log long before they trip the reset.

use log::warn;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
    esp_task_wdt_reset,
};

/// TWDT timeout used by the firmware.
pub const DEFAULT_TIMEOUT_MS: u32 = 5_000;

pub struct LoopWatchdog {
    timeout_ms: u32,
    last_feed_ms: Option<u32>,
    worst_gap_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl LoopWatchdog {
    /// Arm the TWDT for the calling task.  A failed subscription is logged
    /// and the loop keeps running unsupervised.
    pub fn arm(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            last_feed_ms: None,
            worst_gap_ms: 0,
            #[cfg(target_os = "espidf")]
            subscribed: subscribe(timeout_ms),
        }
    }

    /// Record a completed loop pass at `now_ms` and kick the TWDT.
    pub fn feed(&mut self, now_ms: u32) {
        if let Some(last) = self.last_feed_ms {
            let gap = now_ms.wrapping_sub(last);
            if gap > self.worst_gap_ms {
                self.worst_gap_ms = gap;
                if gap > self.timeout_ms / 2 {
                    warn!(
                        "Watchdog: loop pass took {} ms ({} ms budget)",
                        gap, self.timeout_ms
                    );
                }
            }
        }
        self.last_feed_ms = Some(now_ms);

        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the calling (subscribed) task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    /// Longest gap seen between two feeds.
    pub fn worst_gap_ms(&self) -> u32 {
        self.worst_gap_ms
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

#[cfg(target_os = "espidf")]
fn subscribe(timeout_ms: u32) -> bool {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: plain FFI calls; a null handle means the calling task.
    unsafe {
        let ret = esp_task_wdt_reconfigure(&cfg);
        if ret != ESP_OK {
            warn!("Watchdog: reconfigure returned {} (already configured?)", ret);
        }
        let ret = esp_task_wdt_add(core::ptr::null_mut());
        if ret == ESP_OK {
            log::info!("Watchdog: armed ({} ms, panic on trigger)", timeout_ms);
            true
        } else {
            warn!("Watchdog: subscribe failed ({})", ret);
            false
        }
    }
}
