//! Core-pinned background tasks.
//!
//! ESP-IDF implements `std::thread` on pthreads over FreeRTOS tasks.
//! `esp_pthread_set_cfg()` applies to the *next* `pthread_create()` from
//! the calling thread, so configuring and spawning happen back to back in
//! [`TaskSpec::spawn`] and nothing else may create a thread in between.
//!
//! On the host the spec only contributes the thread name and stack size.

use std::io;
use std::thread::{Builder, JoinHandle};

/// CPU cores of the ESP32-S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// PRO_CPU.  Runs the companion link reader.
    Pro = 0,
    /// APP_CPU.  Runs the control loop (the main task).
    App = 1,
}

/// Placement and sizing of one background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    /// NUL-terminated; FreeRTOS keeps the pointer.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

/// Blocking UART reader feeding the receive ring.  Sits above the control
/// loop so bytes are moved out of the driver FIFO promptly.
pub const LINK_READER: TaskSpec = TaskSpec {
    name: "uart-rx\0",
    core: Core::Pro,
    priority: 6,
    stack_kb: 4,
};

impl TaskSpec {
    /// Name without the terminator.
    pub fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }

    /// Start `body` on a new task configured by this spec.
    pub fn spawn(&self, body: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
        self.configure()?;
        log::info!(
            "Task '{}' -> {:?} (prio {}, {} KB stack)",
            self.display_name(),
            self.core,
            self.priority,
            self.stack_kb
        );
        Builder::new()
            .name(self.display_name().into())
            .stack_size(self.stack_kb * 1024)
            .spawn(body)
    }

    #[cfg(target_os = "espidf")]
    fn configure(&self) -> io::Result<()> {
        // SAFETY: plain FFI calls on a config struct we own; the name is a
        // 'static NUL-terminated string.
        let ret = unsafe {
            let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
            cfg.pin_to_core = self.core as i32;
            cfg.prio = i32::from(self.priority);
            cfg.stack_size = (self.stack_kb * 1024) as i32;
            cfg.thread_name = self.name.as_ptr().cast();
            esp_idf_sys::esp_pthread_set_cfg(&cfg)
        };
        if ret == esp_idf_sys::ESP_OK as i32 {
            Ok(())
        } else {
            Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")))
        }
    }

    /// No core pinning off-target.
    #[cfg(not(target_os = "espidf"))]
    fn configure(&self) -> io::Result<()> {
        Ok(())
    }
}
