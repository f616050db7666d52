// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host and motion-platform wire protocols.

pub mod demux;
pub mod messages;
pub mod parser;
pub mod platform;
pub mod telemetry;
pub mod text;

pub use demux::{DebugDemux, Demuxed};
pub use messages::{
    ArrayMode, Direction, HostCommand, PlatformCommand, PlatformResponse, Position,
};
pub use parser::HostParser;
pub use platform::{PlatformEvent, PlatformProtocol};
pub use telemetry::{OutputMode, TelemetryFrame};
pub use text::Console;
