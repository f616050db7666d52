// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error types shared across the firmware.
//!
//! Only [`InitError`] is fatal. Everything else is reported and the main loop carries on.

use core::fmt;

use crate::ranging::ScanState;

/// Serial transport failures seen by task-context code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// A ring buffer had no room; the byte was lost.
    Overflow,
    /// The caller's retry budget ran out while the transmit ring stayed full.
    Timeout,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => f.write_str("ring buffer overflow"),
            Self::Timeout => f.write_str("transmit retry budget exhausted"),
        }
    }
}

/// Receive-side faults reported by a UART.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    Overrun,
    Framing,
    Noise,
    Parity,
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Overrun => "receive overrun",
            Self::Framing => "framing error",
            Self::Noise => "line noise",
            Self::Parity => "parity error",
        };
        f.write_str(s)
    }
}

/// Rejected requests to the ranging engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanError {
    /// A scan or temperature read was requested while the engine was not idle.
    Busy(ScanState),
    /// Results were requested before the engine reached `Complete`.
    NotComplete(ScanState),
    /// The active sensor set was empty.
    EmptySensorSet,
    /// A sensor index outside the installed array.
    InvalidSensor(u8),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy(state) => write!(f, "engine busy in state {:?}", state),
            Self::NotComplete(state) => write!(f, "scan not complete (state {:?})", state),
            Self::EmptySensorSet => f.write_str("empty sensor set"),
            Self::InvalidSensor(s) => write!(f, "invalid sensor index {}", s),
        }
    }
}

/// Invalid configuration values, caught before the board starts sampling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    SampleRate(u32),
    SensorCount(u8),
    SensorAddress { sensor: u8, address: u8 },
    PulseCycles(u8),
    AdcPrecision(u8),
    AdcReference(u16),
    TemperatureTimeout(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRate(hz) => write!(f, "unsupported sample rate {} Hz", hz),
            Self::SensorCount(n) => write!(f, "sensor count {} out of range", n),
            Self::SensorAddress { sensor, address } => {
                write!(f, "sensor {} has invalid mux address {}", sensor, address)
            }
            Self::PulseCycles(n) => write!(f, "pulse burst of {} cycles", n),
            Self::AdcPrecision(bits) => write!(f, "ADC precision of {} bits", bits),
            Self::AdcReference(cv) => write!(f, "ADC reference of {} cV", cv),
            Self::TemperatureTimeout(ms) => write!(f, "temperature timeout of {} ms", ms),
        }
    }
}

/// Board bring-up failure. Nothing downstream can run, so boot aborts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    Config(ConfigError),
    /// A peripheral singleton was already taken.
    Peripherals,
    /// The sample timer cannot be divided down to the configured rate.
    SampleClock { timer_hz: u32, sample_hz: u32 },
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::Peripherals => f.write_str("peripherals already taken"),
            Self::SampleClock { timer_hz, sample_hz } => write!(
                f,
                "cannot derive {} Hz sample clock from {} Hz timer",
                sample_hz, timer_hz
            ),
        }
    }
}
