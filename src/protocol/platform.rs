// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Motion-platform link: response decoding and command sending.

use crate::error::TransportError;
use crate::protocol::demux::{DebugDemux, Demuxed};
use crate::protocol::messages::*;
use crate::transport::{send_all_bounded, ByteChannel};

/// One decoded item from the platform link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent<'a> {
    /// Out-of-band debug text, sentinel and terminator stripped.
    DebugLine(&'a [u8]),
    Response(PlatformResponse),
}

pub struct PlatformProtocol {
    demux: DebugDemux,
    /// Response code waiting for its payload.
    pending: Option<u8>,
}

impl PlatformProtocol {
    pub const fn new() -> Self {
        Self {
            demux: DebugDemux::new(),
            pending: None,
        }
    }

    /// Decode at most one event from the bytes already received.
    ///
    /// Response payloads are read only once complete and bypass the debug demultiplexer, so a
    /// `#` inside position data is not mistaken for a debug line.
    pub fn poll<C: ByteChannel + ?Sized>(&mut self, ch: &mut C) -> Option<PlatformEvent<'_>> {
        loop {
            if let Some(code) = self.pending {
                let need = response_payload_len(code).unwrap_or(0);
                if ch.pending() < need {
                    return None;
                }
                self.pending = None;
                let mut payload = [0u8; 6];
                for slot in payload.iter_mut().take(need) {
                    *slot = ch.try_recv()?;
                }
                return decode_response(code, &payload).map(PlatformEvent::Response);
            }

            let byte = ch.try_recv()?;
            match self.demux.push(byte) {
                Demuxed::Captured => {}
                Demuxed::LineComplete => return Some(PlatformEvent::DebugLine(self.demux.line())),
                Demuxed::Response(code) => {
                    if response_payload_len(code).is_some() {
                        self.pending = Some(code);
                    } else {
                        warn!("unknown platform response {=u8:#x}", code);
                    }
                }
            }
        }
    }

    /// Queue a command for the platform.
    pub fn send<C: ByteChannel + ?Sized>(
        ch: &mut C,
        cmd: PlatformCommand,
        retries: u32,
    ) -> Result<(), TransportError> {
        send_all_bounded(ch, &cmd.encode(), retries)
    }
}

impl Default for PlatformProtocol {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_response(code: u8, payload: &[u8; 6]) -> Option<PlatformResponse> {
    match code {
        RSP_OK => Some(PlatformResponse::Ok),
        RSP_ERROR => Some(PlatformResponse::Error),
        RSP_POSITION => Some(PlatformResponse::Position(Position::from_le_bytes(*payload))),
        RSP_BUTTON => Some(PlatformResponse::Button(payload[0])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChannel;

    #[test]
    fn debug_line_is_not_dispatched_as_responses() {
        // 'h' and 'e' are not response codes, but 0x01..0x04 inside a line must not be either.
        let mut ch = MockChannel::with_input(b"#hello \x01\x03\n\x01");
        let mut proto = PlatformProtocol::new();
        assert_eq!(
            proto.poll(&mut ch),
            Some(PlatformEvent::DebugLine(b"hello \x01\x03"))
        );
        assert_eq!(
            proto.poll(&mut ch),
            Some(PlatformEvent::Response(PlatformResponse::Ok))
        );
        assert_eq!(proto.poll(&mut ch), None);
    }

    #[test]
    fn position_waits_for_full_payload() {
        let mut ch = MockChannel::with_input(&[0x03, 0x23, 0x00, 0xFF]);
        let mut proto = PlatformProtocol::new();
        assert_eq!(proto.poll(&mut ch), None);
        ch.receive(&[0xFF, 0x0A]);
        assert_eq!(proto.poll(&mut ch), None);
        ch.receive(&[0x00]);
        // 0x23 is '#': payload bytes bypass the demultiplexer.
        assert_eq!(
            proto.poll(&mut ch),
            Some(PlatformEvent::Response(PlatformResponse::Position(Position {
                x: 0x23,
                y: -1,
                theta: 10,
            })))
        );
    }

    #[test]
    fn unknown_codes_are_dropped() {
        let mut ch = MockChannel::with_input(&[0x55, 0x04, 0x02]);
        let mut proto = PlatformProtocol::new();
        assert_eq!(
            proto.poll(&mut ch),
            Some(PlatformEvent::Response(PlatformResponse::Button(2)))
        );
    }

    #[test]
    fn send_encodes_command() {
        let mut ch = MockChannel::default();
        PlatformProtocol::send(&mut ch, PlatformCommand::SetDebug(true), 1).unwrap();
        PlatformProtocol::send(&mut ch, PlatformCommand::GetPosition, 1).unwrap();
        assert_eq!(ch.sent, [0x01, 0x01, 0x05]);
    }
}
