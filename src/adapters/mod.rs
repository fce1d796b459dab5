//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                    |
//! |------------|-----------------|--------------------------------|
//! | `hardware` | ScalePort       | HX711 load cells               |
//! |            | ActuatorPort    | ULN2003 stepper, refill pump   |
//! | `log_sink` | EventSink       | Serial log output              |
//! | `nvs`      | BlockStorage    | NVS blob / in-memory image     |
//! | `time`     | MonotonicClock  | 1 kHz tick base                |
//! | `uart`     | LinkPort        | Companion UART (espidf only)   |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
