// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Separates out-of-band debug text from responses on the platform link.
//!
//! The platform interleaves `#...\n` debug lines with its binary responses. Every byte read from
//! the link outside a response payload goes through [`DebugDemux::push`] first.

use heapless::Vec;

use crate::config::DEBUG_LINE_SIZE;
use crate::protocol::messages::{DEBUG_SENTINEL, DEBUG_TERMINATOR};

/// What the demultiplexer did with a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Demuxed {
    /// Consumed as part of a debug line.
    Captured,
    /// The terminator arrived; the line is available from [`DebugDemux::line`].
    LineComplete,
    /// Not debug text; hand it to the response decoder.
    Response(u8),
}

pub struct DebugDemux {
    line: Vec<u8, DEBUG_LINE_SIZE>,
    capturing: bool,
}

impl DebugDemux {
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            capturing: false,
        }
    }

    #[inline]
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn push(&mut self, byte: u8) -> Demuxed {
        if !self.capturing {
            if byte == DEBUG_SENTINEL {
                self.capturing = true;
                self.line.clear();
                return Demuxed::Captured;
            }
            return Demuxed::Response(byte);
        }

        if byte == DEBUG_TERMINATOR {
            self.capturing = false;
            return Demuxed::LineComplete;
        }
        // Past capacity the rest of the line is dropped.
        let _ = self.line.push(byte);
        Demuxed::Captured
    }

    /// Text of the last completed line, without the sentinel or terminator.
    #[inline]
    pub fn line(&self) -> &[u8] {
        &self.line
    }
}

impl Default for DebugDemux {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_line_between_sentinel_and_newline() {
        let mut demux = DebugDemux::new();
        let out: std::vec::Vec<_> = b"#hello\n".iter().map(|&b| demux.push(b)).collect();
        assert!(out[..6].iter().all(|d| *d == Demuxed::Captured));
        assert_eq!(out[6], Demuxed::LineComplete);
        assert_eq!(demux.line(), b"hello");
        assert!(!demux.is_capturing());
    }

    #[test]
    fn bytes_outside_a_line_are_responses() {
        let mut demux = DebugDemux::new();
        assert_eq!(demux.push(0x01), Demuxed::Response(0x01));
        assert_eq!(demux.push(b'\n'), Demuxed::Response(b'\n'));
        demux.push(b'#');
        // A second sentinel inside a line is text.
        assert_eq!(demux.push(b'#'), Demuxed::Captured);
        demux.push(b'\n');
        assert_eq!(demux.line(), b"#");
    }

    #[test]
    fn long_line_truncates_but_stays_in_capture() {
        let mut demux = DebugDemux::new();
        demux.push(b'#');
        for _ in 0..DEBUG_LINE_SIZE + 20 {
            assert_eq!(demux.push(b'x'), Demuxed::Captured);
        }
        assert!(demux.is_capturing());
        assert_eq!(demux.push(b'\n'), Demuxed::LineComplete);
        assert_eq!(demux.line().len(), DEBUG_LINE_SIZE);
    }
}
