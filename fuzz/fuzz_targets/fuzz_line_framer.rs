//! Fuzz target: receive ring → `LineFramer::push`
//!
//! Pushes arbitrary bytes through a small receive ring and the framer and
//! asserts that it never panics, never hands out a line longer than
//! `MAX_LINE_LEN`, and that every command frame starts at the marker.
//!
//! cargo fuzz run fuzz_line_framer

#![no_main]

use libfuzzer_sys::fuzz_target;
use petfeeder::serial::{Frame, LineFramer, MAX_LINE_LEN, RxRing};

fuzz_target!(|data: &[u8]| {
    let mut ring: RxRing<64> = RxRing::new();
    let (mut tx, mut rx) = ring.split();
    let mut framer = LineFramer::new();

    for chunk in data.chunks(48) {
        tx.push_slice(chunk);
        while let Some(byte) = rx.pop() {
            if let Some(Frame::Command(text)) = framer.push(byte) {
                assert!(text.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
                assert!(text.starts_with("AT+"), "command must start at marker");
            }
        }
    }
    assert_eq!(rx.dropped(), 0, "ring drained between chunks");

    // After a reset the framer must accept bytes cleanly again.
    framer.reset();
    assert!(!framer.is_skipping());
});
