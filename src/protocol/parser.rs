// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time decoder for the host command stream.
//!
//! The decoder remembers which command is waiting for payload across calls, so the caller can
//! feed whatever bytes have arrived and come back later for the rest.

use heapless::Vec;

use crate::protocol::messages::*;
use crate::ranging::TriggerSettings;
use crate::transport::ByteChannel;

/// Longest fixed payload (trigger configuration, five `u16`).
const MAX_FIXED_PAYLOAD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Fixed { code: u8, need: usize },
    RobotLength,
    RobotPayload { len: usize },
}

pub struct HostParser {
    state: State,
    fixed: Vec<u8, MAX_FIXED_PAYLOAD>,
    robot: RobotPayload,
}

impl HostParser {
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            fixed: Vec::new(),
            robot: Vec::new(),
        }
    }

    /// `true` while a command has been started but not completed.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state != State::Idle
    }

    /// Read received bytes until one command completes. Bytes after it stay in the channel.
    pub fn poll<C: ByteChannel + ?Sized>(&mut self, ch: &mut C) -> Option<HostCommand> {
        while let Some(byte) = ch.try_recv() {
            if let Some(cmd) = self.push(byte) {
                return Some(cmd);
            }
        }
        None
    }

    /// Process a single incoming byte. Returns `Some(HostCommand)` once a command is complete.
    pub fn push(&mut self, byte: u8) -> Option<HostCommand> {
        match self.state {
            State::Idle => match byte {
                CMD_ROBOT_COMMAND => {
                    self.state = State::RobotLength;
                    None
                }
                code => match host_payload_len(code) {
                    Some(0) => Some(decode_fixed(code, &[])),
                    Some(need) => {
                        self.fixed.clear();
                        self.state = State::Fixed { code, need };
                        None
                    }
                    None => Some(HostCommand::Unrecognized(code)),
                },
            },
            State::Fixed { code, need } => {
                let _ = self.fixed.push(byte);
                if self.fixed.len() < need {
                    return None;
                }
                self.state = State::Idle;
                Some(decode_fixed(code, &self.fixed))
            }
            State::RobotLength => {
                self.robot.clear();
                if byte == 0 {
                    self.state = State::Idle;
                    return Some(HostCommand::RobotCommand(Vec::new()));
                }
                self.state = State::RobotPayload { len: byte as usize };
                None
            }
            State::RobotPayload { len } => {
                let _ = self.robot.push(byte);
                if self.robot.len() < len {
                    return None;
                }
                self.state = State::Idle;
                Some(HostCommand::RobotCommand(core::mem::take(&mut self.robot)))
            }
        }
    }
}

impl Default for HostParser {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_fixed(code: u8, payload: &[u8]) -> HostCommand {
    let word = |i: usize| u16::from_le_bytes([payload[2 * i], payload[2 * i + 1]]);
    match code {
        CMD_SET_DEBUG => HostCommand::SetDebug(payload[0] != 0),
        CMD_SET_SCAN_MODE => HostCommand::SetScanMode(payload[0]),
        CMD_SELECT_SENSOR => HostCommand::SelectSensor(payload[0]),
        CMD_SET_OUTPUT => HostCommand::SetOutput(payload[0]),
        CMD_SET_TRIGGERS => HostCommand::SetTriggers(TriggerSettings {
            changeover_us: word(0),
            near_lower_cv: word(1),
            near_upper_cv: word(2),
            far_lower_cv: word(3),
            far_upper_cv: word(4),
        }),
        CMD_PING => HostCommand::Ping,
        CMD_PASSTHROUGH => HostCommand::Passthrough,
        _ => HostCommand::Unrecognized(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut HostParser, bytes: &[u8]) -> std::vec::Vec<HostCommand> {
        bytes.iter().filter_map(|&b| parser.push(b)).collect()
    }

    #[test]
    fn fixed_commands() {
        let mut p = HostParser::new();
        assert_eq!(
            feed(&mut p, &[0x01, 0x01, 0x03, 0x07, 0x07, 0x08]),
            [
                HostCommand::SetDebug(true),
                HostCommand::SelectSensor(7),
                HostCommand::Ping,
                HostCommand::Passthrough,
            ]
        );
    }

    #[test]
    fn payload_split_across_calls() {
        let mut p = HostParser::new();
        let bytes = [0x04, 0xDC, 0x05, 0x7D, 0x00, 0xCD, 0x00, 0x96, 0x00, 0xB4, 0x00];
        assert!(feed(&mut p, &bytes[..4]).is_empty());
        assert!(p.is_pending());
        assert_eq!(
            feed(&mut p, &bytes[4..]),
            [HostCommand::SetTriggers(TriggerSettings {
                changeover_us: 1500,
                near_lower_cv: 125,
                near_upper_cv: 205,
                far_lower_cv: 150,
                far_upper_cv: 180,
            })]
        );
        assert!(!p.is_pending());
    }

    #[test]
    fn robot_command_longer_than_a_ring() {
        let mut p = HostParser::new();
        assert!(p.push(0x06).is_none());
        assert!(p.push(200).is_none());
        for i in 0..199u8 {
            assert!(p.push(i).is_none());
        }
        let Some(HostCommand::RobotCommand(payload)) = p.push(199) else {
            panic!("expected robot command");
        };
        assert_eq!(payload.len(), 200);
        assert_eq!(payload[199], 199);
        assert_eq!(p.push(0x06), None);
        assert_eq!(p.push(0), Some(HostCommand::RobotCommand(Vec::new())));
    }

    #[test]
    fn poll_stops_after_one_command() {
        let mut p = HostParser::new();
        let mut ch = crate::testing::MockChannel::with_input(&[0x07, 0x08, 0xAA]);
        assert_eq!(p.poll(&mut ch), Some(HostCommand::Ping));
        assert_eq!(ch.pending(), 2);
        assert_eq!(p.poll(&mut ch), Some(HostCommand::Passthrough));
        assert_eq!(ch.try_recv(), Some(0xAA));
    }

    #[test]
    fn unknown_code_does_not_consume_the_next_byte() {
        let mut p = HostParser::new();
        assert_eq!(
            feed(&mut p, &[0x42, 0x07]),
            [HostCommand::Unrecognized(0x42), HostCommand::Ping]
        );
        assert_eq!(p.push(0x00), Some(HostCommand::Unrecognized(0x00)));
    }
}
