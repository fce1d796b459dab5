//! Line framer for the companion link.
//!
//! Accumulates bytes into `\n`-terminated lines (carriage returns are
//! discarded) and locates the `AT+` marker so leading noise on the wire is
//! tolerated.  Lines longer than [`MAX_LINE_LEN`] are dropped whole: the
//! framer enters an overflow-skip state and discards bytes until the next
//! newline.
//!
//! The slice carried by a returned [`Frame`] borrows the internal buffer and
//! stays valid until the next call to [`LineFramer::push`].

use heapless::Vec;

/// Longest line (excluding terminator) that will be dispatched.
pub const MAX_LINE_LEN: usize = 256;

const MARKER: &[u8] = b"AT+";

/// A completed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Text starting at the `AT+` marker.
    Command(&'a str),
    /// Non-empty line without a usable marker (answered with SYNTAX).
    Malformed,
}

/// Streaming line accumulator.
pub struct LineFramer {
    buf: Vec<u8, MAX_LINE_LEN>,
    overflow: bool,
    /// Set after a line was handed out; the buffer is cleared lazily on the
    /// next push so the returned slice can borrow it.
    consumed: bool,
}

impl LineFramer {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflow: false,
            consumed: false,
        }
    }

    /// Feed one byte.  Returns a frame when `byte` terminates a line.
    pub fn push(&mut self, byte: u8) -> Option<Frame<'_>> {
        if self.consumed {
            self.buf.clear();
            self.consumed = false;
        }

        match byte {
            b'\r' => None,
            b'\n' => {
                if self.overflow {
                    self.overflow = false;
                    self.buf.clear();
                    log::warn!("framer: oversized line dropped");
                    return None;
                }
                if self.buf.is_empty() {
                    return None;
                }
                self.consumed = true;
                Some(Self::classify(&self.buf))
            }
            _ if self.overflow => None,
            _ => {
                if self.buf.push(byte).is_err() {
                    self.overflow = true;
                    self.buf.clear();
                }
                None
            }
        }
    }

    /// Whether the framer is currently discarding an oversized line.
    pub fn is_skipping(&self) -> bool {
        self.overflow
    }

    /// Drop any partial line and clear overflow state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflow = false;
        self.consumed = false;
    }

    fn classify(line: &[u8]) -> Frame<'_> {
        let Some(start) = line.windows(MARKER.len()).position(|w| w == MARKER) else {
            return Frame::Malformed;
        };
        match core::str::from_utf8(&line[start..]) {
            Ok(text) => Frame::Command(text),
            Err(_) => Frame::Malformed,
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
