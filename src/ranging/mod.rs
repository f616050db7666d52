// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Ultrasonic ranging: acquisition, storage and time-of-flight extraction.

pub mod calibration;
pub mod engine;
pub mod extract;
pub mod table;
pub mod trigger;

pub use calibration::{speed_of_sound, SensorCalibration, TemperatureModel};
pub use engine::{
    Acquisition, AcquisitionHw, AdcChannel, Completed, RangingEngine, ScanMode, ScanSession,
    ScanState, SensorSet,
};
pub use table::{RangeReadings, WaveformTable, NO_DETECTION};
pub use trigger::{AdcScale, SampleTiming, TriggerBand, TriggerConfig, TriggerSettings};
