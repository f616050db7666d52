// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wire codes for the host link and the motion-platform link.
//!
//! Host link (host → array): one command byte, then a fixed payload or, for the robot relay
//! command, a length byte and that many raw bytes. There is no sync byte or checksum.

use heapless::Vec;

use crate::ranging::TriggerSettings;

// Host command IDs
pub const CMD_SET_DEBUG: u8 = 0x01;
pub const CMD_SET_SCAN_MODE: u8 = 0x02;
pub const CMD_SELECT_SENSOR: u8 = 0x03;
pub const CMD_SET_TRIGGERS: u8 = 0x04;
pub const CMD_SET_OUTPUT: u8 = 0x05;
pub const CMD_ROBOT_COMMAND: u8 = 0x06;
pub const CMD_PING: u8 = 0x07;
pub const CMD_PASSTHROUGH: u8 = 0x08;

// Platform command IDs (array → platform)
pub const PLAT_SET_DEBUG: u8 = 0x01;
pub const PLAT_SET_MODE: u8 = 0x02;
pub const PLAT_SET_MOTOR_SPEED: u8 = 0x03;
pub const PLAT_SET_POSITION: u8 = 0x04;
pub const PLAT_GET_POSITION: u8 = 0x05;
pub const PLAT_BEEP: u8 = 0x06;

// Platform response IDs (platform → array)
pub const RSP_OK: u8 = 0x01;
pub const RSP_ERROR: u8 = 0x02;
pub const RSP_POSITION: u8 = 0x03;
pub const RSP_BUTTON: u8 = 0x04;

/// Starts an out-of-band debug line on the platform link.
pub const DEBUG_SENTINEL: u8 = b'#';
pub const DEBUG_TERMINATOR: u8 = b'\n';

/// A robot relay payload is prefixed by a single length byte.
pub const MAX_ROBOT_PAYLOAD: usize = u8::MAX as usize;

pub type RobotPayload = Vec<u8, MAX_ROBOT_PAYLOAD>;

/// Payload bytes following a fixed-size host command, or `None` for the variable-length ones.
pub const fn host_payload_len(code: u8) -> Option<usize> {
    match code {
        CMD_SET_DEBUG | CMD_SET_SCAN_MODE | CMD_SELECT_SENSOR | CMD_SET_OUTPUT => Some(1),
        CMD_SET_TRIGGERS => Some(10),
        CMD_PING | CMD_PASSTHROUGH => Some(0),
        _ => None,
    }
}

/// Fully received host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    SetDebug(bool),
    /// Raw mode byte; see [`ArrayMode::from_byte`].
    SetScanMode(u8),
    SelectSensor(u8),
    SetTriggers(TriggerSettings),
    /// Raw output byte; see [`OutputMode::from_byte`](crate::protocol::OutputMode::from_byte).
    SetOutput(u8),
    RobotCommand(RobotPayload),
    Ping,
    /// Switch permanently to a raw relay between host and platform.
    Passthrough,
    Unrecognized(u8),
}

/// Array scanning mode selected by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArrayMode {
    Disabled,
    Single,
    Complete,
}

impl ArrayMode {
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Disabled),
            1 => Some(Self::Single),
            2 => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Robot position reported by or sent to the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub x: i16,
    pub y: i16,
    pub theta: i16,
}

impl Position {
    pub fn from_le_bytes(b: [u8; 6]) -> Self {
        Self {
            x: i16::from_le_bytes([b[0], b[1]]),
            y: i16::from_le_bytes([b[2], b[3]]),
            theta: i16::from_le_bytes([b[4], b[5]]),
        }
    }

    pub fn to_le_bytes(self) -> [u8; 6] {
        let [x0, x1] = self.x.to_le_bytes();
        let [y0, y1] = self.y.to_le_bytes();
        let [t0, t1] = self.theta.to_le_bytes();
        [x0, x1, y0, y1, t0, t1]
    }
}

/// Fully received platform response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformResponse {
    Ok,
    Error,
    Position(Position),
    Button(u8),
}

/// Payload bytes following a platform response code, or `None` for an unknown code.
pub const fn response_payload_len(code: u8) -> Option<usize> {
    match code {
        RSP_OK | RSP_ERROR => Some(0),
        RSP_POSITION => Some(6),
        RSP_BUTTON => Some(1),
        _ => None,
    }
}

/// Drive direction in manual mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward = 0,
    Right = 1,
    Left = 2,
    Reverse = 3,
}

/// Platform operating mode byte for manual driving.
pub const PLATFORM_MODE_MANUAL: u8 = 0x00;

/// Commands sent to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformCommand {
    SetDebug(bool),
    SetMode(u8),
    /// `dir_or_max` is a [`Direction`] in manual mode and a speed cap in automatic mode, where
    /// `left` and `right` are ignored by the platform.
    MotorSpeed { dir_or_max: u8, left: u8, right: u8 },
    SetPosition(Position),
    GetPosition,
    Beep,
}

impl PlatformCommand {
    pub fn drive(direction: Direction, left: u8, right: u8) -> Self {
        Self::MotorSpeed {
            dir_or_max: direction as u8,
            left,
            right,
        }
    }

    pub fn encode(&self) -> Vec<u8, 7> {
        let mut out = Vec::new();
        // Longest encoding is seven bytes; the pushes cannot fail.
        match *self {
            Self::SetDebug(on) => {
                let _ = out.extend_from_slice(&[PLAT_SET_DEBUG, on as u8]);
            }
            Self::SetMode(mode) => {
                let _ = out.extend_from_slice(&[PLAT_SET_MODE, mode]);
            }
            Self::MotorSpeed {
                dir_or_max,
                left,
                right,
            } => {
                let _ = out.extend_from_slice(&[PLAT_SET_MOTOR_SPEED, dir_or_max, left, right]);
            }
            Self::SetPosition(pos) => {
                let _ = out.push(PLAT_SET_POSITION);
                let _ = out.extend_from_slice(&pos.to_le_bytes());
            }
            Self::GetPosition => {
                let _ = out.push(PLAT_GET_POSITION);
            }
            Self::Beep => {
                let _ = out.push(PLAT_BEEP);
            }
        }
        out
    }
}
