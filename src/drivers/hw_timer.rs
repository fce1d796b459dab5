//! Hardware tick timer using ESP-IDF's esp_timer API.
//!
//! Creates one 1 kHz periodic timer whose callback advances the tick base
//! in [`crate::events`].  On simulation targets nothing is started; tests
//! call [`events::on_millisecond_tick`] directly.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely touch the atomics in `events`.

#[cfg(target_os = "espidf")]
use crate::events;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

/// Tick period in microseconds.
pub const TICK_PERIOD_US: u64 = 1_000;

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: TICK_TIMER is written once in `start_timers()` before any
/// timer callbacks fire.  Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn tick_timer() -> esp_timer_handle_t { unsafe { TICK_TIMER } }

#[cfg(target_os = "espidf")]
unsafe extern "C" fn millisecond_tick_cb(_arg: *mut core::ffi::c_void) {
    events::on_millisecond_tick();
}

/// Start the 1 kHz tick timer.
#[cfg(target_os = "espidf")]
pub fn start_timers() {
    // SAFETY: TICK_TIMER is written here once at boot from the single
    // main-task context before any timer callbacks fire.  The callback
    // only touches lock-free atomics.
    unsafe {
        let tick_args = esp_timer_create_args_t {
            callback: Some(millisecond_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"tick\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };
        let ret = esp_timer_create(&tick_args, &raw mut TICK_TIMER);
        if ret != ESP_OK {
            log::error!("hw_timer: tick timer create failed (rc={})", ret);
            return;
        }
        let ret = esp_timer_start_periodic(tick_timer(), TICK_PERIOD_US);
        if ret != ESP_OK {
            log::error!("hw_timer: tick timer start failed (rc={})", ret);
            return;
        }

        info!("hw_timer: tick@1kHz started");
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_timers() {
    log::info!("hw_timer(sim): timer not started (tick base driven by caller)");
}
