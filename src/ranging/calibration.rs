// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Per-sensor mounting offsets and the temperature model.
//!
//! Offsets depend on how each transducer sits in the chassis. Different hardware revisions have
//! used different corrections, so they are kept as named tables rather than baked into the
//! extraction code. Confirm the table against the target hardware before relying on absolute
//! distances.

use crate::config::MAX_SENSORS;
use crate::ranging::trigger::AdcScale;

/// Signed millimetre correction added to each sensor's raw time-of-flight distance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorCalibration {
    offsets_mm: [i16; MAX_SENSORS],
}

impl SensorCalibration {
    /// No correction.
    pub const NONE: Self = Self {
        offsets_mm: [0; MAX_SENSORS],
    };

    /// Front pair (sensors 0 and 5) recessed by 10 mm.
    pub const FRONT_PAIR_RECESSED: Self = Self::NONE.with_offset(0, 10).with_offset(5, 10);

    /// Every sensor reads 20 mm long.
    pub const UNIFORM_SHORTEN_20: Self = Self {
        offsets_mm: [-20; MAX_SENSORS],
    };

    pub const fn from_offsets(offsets_mm: [i16; MAX_SENSORS]) -> Self {
        Self { offsets_mm }
    }

    /// Replace the offset of one sensor. Out-of-range sensors are ignored.
    pub const fn with_offset(mut self, sensor: usize, offset_mm: i16) -> Self {
        if sensor < MAX_SENSORS {
            self.offsets_mm[sensor] = offset_mm;
        }
        self
    }

    #[inline]
    pub fn offset_mm(&self, sensor: u8) -> i16 {
        self.offsets_mm.get(sensor as usize).copied().unwrap_or(0)
    }
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::NONE
    }
}

/// Linear temperature sensor: `T = (V - V25) / slope + 25 °C`.
///
/// Defaults describe the STM32F7 internal sensor (V25 = 760 mV, 2.5 mV/°C).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureModel {
    pub v25_mv: i32,
    pub slope_uv_per_c: i32,
}

impl TemperatureModel {
    pub const STM32F7_INTERNAL: Self = Self {
        v25_mv: 760,
        slope_uv_per_c: 2_500,
    };

    /// Convert a raw conversion into tenths of a degree Celsius.
    pub fn deci_celsius(&self, code: u16, scale: &AdcScale) -> i16 {
        let mv = scale.code_to_millivolts(code) as i32;
        let tenths = (mv - self.v25_mv) * 10_000 / self.slope_uv_per_c + 250;
        tenths.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}

/// Speed of sound in air, in thousandths of a millimetre per microsecond (equivalently m/s).
///
/// `(3_313_000 + 606 * T) / 10_000` with `T` in tenths of a degree Celsius.
#[inline]
pub const fn speed_of_sound(temperature_deci_c: i16) -> i32 {
    (3_313_000 + 606 * temperature_deci_c as i32) / 10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_of_sound_matches_linear_model() {
        assert_eq!(speed_of_sound(210), 344);
        assert_eq!(speed_of_sound(0), 331);
        assert_eq!(speed_of_sound(-100), 325);
    }

    #[test]
    fn named_tables() {
        let front = SensorCalibration::FRONT_PAIR_RECESSED;
        assert_eq!(front.offset_mm(0), 10);
        assert_eq!(front.offset_mm(5), 10);
        assert_eq!(front.offset_mm(1), 0);
        assert_eq!(SensorCalibration::UNIFORM_SHORTEN_20.offset_mm(9), -20);
        assert_eq!(SensorCalibration::NONE.offset_mm(42), 0);
    }

    #[test]
    fn internal_sensor_conversion() {
        let scale = AdcScale::new(12, 330);
        // 943 * 3300 / 4095 = 759 mV, just under V25.
        assert_eq!(
            TemperatureModel::STM32F7_INTERNAL.deci_celsius(943, &scale),
            246
        );
        // 1000 -> 805 mV -> (805 - 760) * 4 + 250 = 430 (43.0 °C)
        assert_eq!(
            TemperatureModel::STM32F7_INTERNAL.deci_celsius(1000, &scale),
            430
        );
    }
}
