//! Companion link plumbing: the receive ring and the line framer.
//!
//! ```text
//!  UART reader ──▶ RxProducer ══ RxRing ══ RxConsumer ──▶ LineFramer ──▶ dispatcher
//!  (receive ctx)                                           (control loop)
//! ```

pub mod framer;
pub mod ring;

pub use framer::{Frame, LineFramer, MAX_LINE_LEN};
pub use ring::{ByteSource, RX_RING_SIZE, RxConsumer, RxProducer, RxRing};
