//! Companion UART adapter.
//!
//! The receive side runs on its own FreeRTOS task: it blocks on the UART
//! driver and pushes every byte into the [`RxProducer`] half of the ring.
//! The control loop drains the consumer half.  The transmit side is a
//! plain [`LinkPort`] used from the control loop only.

use std::thread::JoinHandle;

use esp_idf_hal::delay;
use esp_idf_hal::uart::{UartRxDriver, UartTxDriver};
use log::{debug, warn};

use crate::app::ports::LinkPort;
use crate::drivers::task::LINK_READER;
use crate::serial::{RX_RING_SIZE, RxProducer};

/// Line terminator appended to everything we send.
const CRLF: &[u8] = b"\r\n";

pub struct UartLink {
    tx: UartTxDriver<'static>,
}

impl UartLink {
    pub fn new(tx: UartTxDriver<'static>) -> Self {
        Self { tx }
    }
}

impl LinkPort for UartLink {
    fn write_line(&mut self, line: &str) {
        debug!("UART TX: {}", line);
        for chunk in [line.as_bytes(), CRLF] {
            if let Err(err) = self.tx.write(chunk) {
                warn!("UART TX error: {:?}", err);
                return;
            }
        }
        let _ = self.tx.wait_done(delay::BLOCK);
    }
}

/// Spawn the reader task feeding `producer`.
pub fn spawn_reader(
    rx: UartRxDriver<'static>,
    mut producer: RxProducer<'static, RX_RING_SIZE>,
) -> std::io::Result<JoinHandle<()>> {
    LINK_READER.spawn(move || {
        let mut buf = [0u8; 64];
        loop {
            match rx.read(&mut buf, delay::BLOCK) {
                Ok(count) if count > 0 => {
                    let accepted = producer.push_slice(&buf[..count]);
                    if accepted < count {
                        warn!("UART RX: ring full, dropped {} bytes", count - accepted);
                    }
                }
                Ok(_) => {}
                Err(err) => warn!("UART RX error: {:?}", err),
            }
        }
    })
}
