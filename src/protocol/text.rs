// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Human-readable text on the host link.
//!
//! Debug lines look like `#DBG: US MODE - SINGLE\n` and are only written while the host has
//! verbose output enabled. The host tooling treats the leading `#` as a text marker, distinct
//! from the `0xFF 0xFF` telemetry frame header.

use crate::error::TransportError;
use crate::transport::{send_all_bounded, ByteChannel};

pub const DEBUG_PREFIX: &str = "#DBG: ";

/// Verbose-output switch plus the retry budget used for every text byte.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    enabled: bool,
    retries: u32,
}

impl Console {
    pub const fn new(retries: u32) -> Self {
        Self {
            enabled: false,
            retries,
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Start a `#DBG: ` line, or `None` while verbose output is off.
    pub fn debug<'a, C: ByteChannel + ?Sized>(&self, ch: &'a mut C) -> Option<TextLine<'a, C>> {
        if !self.enabled {
            return None;
        }
        Some(self.text(ch).str(DEBUG_PREFIX))
    }

    /// One complete `#DBG: <msg>\n` line.
    pub fn message<C: ByteChannel + ?Sized>(&self, ch: &mut C, msg: &str) {
        if let Some(line) = self.debug(ch) {
            let _ = line.str(msg).finish();
        }
    }

    /// Start an unprefixed line, written regardless of the verbose switch.
    pub fn text<'a, C: ByteChannel + ?Sized>(&self, ch: &'a mut C) -> TextLine<'a, C> {
        TextLine {
            ch,
            retries: self.retries,
            result: Ok(()),
        }
    }
}

/// Builder for one line of text. Stops writing at the first failed byte.
pub struct TextLine<'a, C: ByteChannel + ?Sized> {
    ch: &'a mut C,
    retries: u32,
    result: Result<(), TransportError>,
}

impl<'a, C: ByteChannel + ?Sized> TextLine<'a, C> {
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        if self.result.is_ok() {
            self.result = send_all_bounded(&mut *self.ch, bytes, self.retries);
        }
        self
    }

    #[inline]
    pub fn str(self, s: &str) -> Self {
        self.bytes(s.as_bytes())
    }

    /// Decimal, with a leading `-` for negative values.
    pub fn int<I: itoa::Integer>(self, n: I) -> Self {
        let mut buf = itoa::Buffer::new();
        let s = buf.format(n);
        self.bytes(s.as_bytes())
    }

    /// Terminate with `\n`.
    pub fn finish(self) -> Result<(), TransportError> {
        let line = self.bytes(b"\n");
        if line.result.is_err() {
            warn!("host text line truncated");
        }
        line.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChannel;

    #[test]
    fn silent_until_enabled() {
        let mut ch = MockChannel::default();
        let mut console = Console::new(10);
        console.message(&mut ch, "PING!");
        assert!(ch.sent.is_empty());

        console.set_enabled(true);
        console.message(&mut ch, "PING!");
        assert_eq!(ch.sent, b"#DBG: PING!\n");
    }

    #[test]
    fn signed_integers() {
        let mut ch = MockChannel::default();
        let console = Console::new(10);
        let _ = console
            .text(&mut ch)
            .int(-12i16)
            .str(",")
            .int(300u16)
            .finish();
        assert_eq!(ch.sent, b"-12,300\n");
    }

    #[test]
    fn full_channel_truncates() {
        let mut ch = MockChannel::default();
        ch.tx_capacity = 4;
        let console = Console::new(3);
        assert_eq!(
            console.text(&mut ch).str("Ready!").finish(),
            Err(TransportError::Timeout)
        );
        assert_eq!(ch.sent, b"Read");
    }
}
