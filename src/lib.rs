// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Sonar Array Firmware
//!
//! Acquisition and transport core for a ten-transducer ultrasonic ranging array on a small mobile
//! robot, targeting an STM32F777 MCU. The array fires each transducer in turn, samples the echo
//! at a fixed rate under interrupt control, extracts a temperature-compensated range, and talks
//! to a host and to the robot's motion platform over two UARTs.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`transport`] | Interrupt-driven serial channels over fixed-size ring buffers |
//! | [`ranging`] | Scan state machine, waveform storage, time-of-flight extraction |
//! | [`protocol`] | Host command decoding, platform link, telemetry frames, debug text |
//! | [`app`] | Main-loop tasks tying the above together |
//! | [`config`] | Board constants and runtime configuration |
//! | `hw` | STM32F7 peripherals (`board` feature) |
//!
//! Everything except `hw` is hardware independent and is unit tested on the host:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features board
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

pub mod app;
pub mod config;
pub mod error;
pub mod protocol;
pub mod ranging;
pub mod transport;

#[cfg(feature = "board")]
pub mod hw;

#[cfg(test)]
mod testing;

pub use app::{ScanPlan, SonarApp};
pub use config::Config;
