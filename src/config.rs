// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board constants and the runtime configuration.
//!
//! The constants describe the canonical hardware: ten transducers behind an address mux, a
//! 12-bit ADC referenced to 3.30 V, and an 80 kHz sample clock. [`Config`] bundles them so tests
//! and alternative boards can override individual values.

use crate::error::ConfigError;
use crate::ranging::calibration::{SensorCalibration, TemperatureModel};
use crate::ranging::trigger::{AdcScale, SampleTiming, TriggerSettings};

/// Transducers the firmware can address.
pub const MAX_SENSORS: usize = 10;

/// Samples stored per transducer per scan (30 ms at 80 kHz, about 5 m of one-way range).
pub const SAMPLES_PER_SCAN: usize = 2400;

/// Echo sample rate (Hz).
pub const SAMPLE_RATE_HZ: u32 = 80_000;

/// 40 kHz cycles per transmit burst.
pub const PULSE_CYCLES: u8 = 8;

/// Transmit burst carrier (Hz).
pub const PULSE_CARRIER_HZ: u32 = 40_000;

/// Sensor position to mux address.
pub const SENSOR_ADDRESS_MAP: [u8; MAX_SENSORS] = [9, 10, 11, 1, 2, 3, 4, 5, 6, 8];

/// Mux addresses are four bits wide.
pub const MAX_SENSOR_ADDRESS: u8 = 0x0F;

pub const ADC_PRECISION_BITS: u8 = 12;

/// ADC reference in hundredths of a volt.
pub const ADC_REFERENCE_CV: u16 = 330;

// Default trigger bands (hundredths of a volt around the 1.65 V bias, microseconds).
pub const TRIGGER_BASE_CV: u16 = 165;
pub const TRIGGER_OFFSET_NEAR_CV: u16 = 40;
pub const TRIGGER_OFFSET_FAR_CV: u16 = 15;
pub const TRIGGER_CHANGEOVER_US: u16 = 1_500;

/// Assumed air temperature until the first measurement (tenths of °C).
pub const DEFAULT_TEMPERATURE_DECI_C: i16 = 210;

/// How often an idle array re-reads the temperature sensor (ms).
pub const TEMPERATURE_REFRESH_MS: u32 = 10_000;

/// Longest wait for a temperature conversion before it counts as a missed interrupt (ms).
pub const TEMPERATURE_TIMEOUT_MS: u32 = 5;

/// Attempts a task makes to queue one byte on a full transmit ring before dropping it.
pub const TX_RETRY_LIMIT: u32 = 50_000;

/// Ring buffer capacity per direction per serial channel.
pub const SERIAL_BUFFER_SIZE: usize = 128;

/// Longest platform debug line kept; the rest of the line is dropped.
pub const DEBUG_LINE_SIZE: usize = 128;

pub const HOST_BAUD: u32 = 115_200;
pub const PLATFORM_BAUD: u32 = 115_200;

/// Runtime configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub sample_rate_hz: u32,
    pub pulse_cycles: u8,
    /// Installed transducers; valid sensor indexes are `0..sensor_count`.
    pub sensor_count: u8,
    pub sensor_addresses: [u8; MAX_SENSORS],
    pub adc: AdcScale,
    pub triggers: TriggerSettings,
    pub calibration: SensorCalibration,
    pub temperature_model: TemperatureModel,
    pub default_temperature_deci_c: i16,
    pub temperature_refresh_ms: u32,
    pub temperature_timeout_ms: u32,
    pub tx_retry_limit: u32,
}

impl Config {
    pub const DEFAULT: Self = Self {
        sample_rate_hz: SAMPLE_RATE_HZ,
        pulse_cycles: PULSE_CYCLES,
        sensor_count: MAX_SENSORS as u8,
        sensor_addresses: SENSOR_ADDRESS_MAP,
        adc: AdcScale::new(ADC_PRECISION_BITS, ADC_REFERENCE_CV),
        triggers: TriggerSettings::symmetric(
            TRIGGER_BASE_CV,
            TRIGGER_OFFSET_NEAR_CV,
            TRIGGER_OFFSET_FAR_CV,
            TRIGGER_CHANGEOVER_US,
        ),
        calibration: SensorCalibration::NONE,
        temperature_model: TemperatureModel::STM32F7_INTERNAL,
        default_temperature_deci_c: DEFAULT_TEMPERATURE_DECI_C,
        temperature_refresh_ms: TEMPERATURE_REFRESH_MS,
        temperature_timeout_ms: TEMPERATURE_TIMEOUT_MS,
        tx_retry_limit: TX_RETRY_LIMIT,
    };

    #[inline]
    pub const fn timing(&self) -> SampleTiming {
        SampleTiming::new(self.sample_rate_hz)
    }

    /// Check every value the engine divides by or indexes with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 || self.sample_rate_hz > 1_000_000 {
            return Err(ConfigError::SampleRate(self.sample_rate_hz));
        }
        if self.sensor_count == 0 || self.sensor_count as usize > MAX_SENSORS {
            return Err(ConfigError::SensorCount(self.sensor_count));
        }
        if self.temperature_timeout_ms == 0 {
            return Err(ConfigError::TemperatureTimeout(self.temperature_timeout_ms));
        }
        if self.pulse_cycles == 0 {
            return Err(ConfigError::PulseCycles(self.pulse_cycles));
        }
        if self.adc.precision_bits() == 0 || self.adc.precision_bits() > 16 {
            return Err(ConfigError::AdcPrecision(self.adc.precision_bits()));
        }
        if self.adc.reference_cv() == 0 {
            return Err(ConfigError::AdcReference(self.adc.reference_cv()));
        }
        for (sensor, &address) in self
            .sensor_addresses
            .iter()
            .enumerate()
            .take(self.sensor_count as usize)
        {
            if address > MAX_SENSOR_ADDRESS {
                return Err(ConfigError::SensorAddress {
                    sensor: sensor as u8,
                    address,
                });
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = Config {
            sample_rate_hz: 0,
            ..Config::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::SampleRate(0)));

        let cfg = Config {
            sensor_count: 11,
            ..Config::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::SensorCount(11)));

        let mut addresses = SENSOR_ADDRESS_MAP;
        addresses[3] = 0x10;
        let cfg = Config {
            sensor_addresses: addresses,
            ..Config::DEFAULT
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::SensorAddress {
                sensor: 3,
                address: 0x10
            })
        );

        let cfg = Config {
            adc: AdcScale::new(12, 0),
            ..Config::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::AdcReference(0)));

        let cfg = Config {
            temperature_timeout_ms: 0,
            ..Config::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::TemperatureTimeout(0)));
    }
}
