//! Receive ring between the UART reader and the control loop.
//!
//! A fixed-capacity SPSC byte queue split into a [`RxProducer`] half (owned
//! by the receive context) and a [`RxConsumer`] half (owned by the loop).
//! Each half owns exactly one index of the underlying
//! [`heapless::spsc::Queue`], so no locking is needed.
//!
//! Overflow policy is drop-newest: a push into a full ring discards the
//! incoming byte and leaves buffered data intact.  Dropped bytes are counted
//! for diagnostics.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

/// Ring size used by the firmware.  Usable capacity is `RX_RING_SIZE - 1`.
pub const RX_RING_SIZE: usize = 512;

/// Anything the line framer can drain bytes from.
pub trait ByteSource {
    /// Pop the next byte, or `None` if nothing is buffered.
    fn pop_byte(&mut self) -> Option<u8>;
}

/// Backing storage for the receive ring.  Create once, then [`split`](Self::split).
pub struct RxRing<const N: usize> {
    queue: Queue<u8, N>,
    dropped: AtomicU32,
}

impl<const N: usize> RxRing<N> {
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Number of bytes the ring can hold at once.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Split into producer and consumer halves.
    pub fn split(&mut self) -> (RxProducer<'_, N>, RxConsumer<'_, N>) {
        let (producer, consumer) = self.queue.split();
        (
            RxProducer {
                inner: producer,
                dropped: &self.dropped,
            },
            RxConsumer {
                inner: consumer,
                dropped: &self.dropped,
            },
        )
    }
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write half.  Lives in the receive context.
pub struct RxProducer<'a, const N: usize> {
    inner: Producer<'a, u8, N>,
    dropped: &'a AtomicU32,
}

impl<const N: usize> RxProducer<'_, N> {
    /// Push one byte.  Returns `false` if the ring was full and the byte
    /// was dropped.  Never blocks.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.inner.enqueue(byte).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Push a slice, returning how many bytes were accepted.
    pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.push(b)).count()
    }
}

/// Read half.  Lives in the control loop.
pub struct RxConsumer<'a, const N: usize> {
    inner: Consumer<'a, u8, N>,
    dropped: &'a AtomicU32,
}

impl<const N: usize> RxConsumer<'_, N> {
    pub fn pop(&mut self) -> Option<u8> {
        self.inner.dequeue()
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    /// Total bytes discarded by the producer since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> ByteSource for RxConsumer<'_, N> {
    fn pop_byte(&mut self) -> Option<u8> {
        self.pop()
    }
}
