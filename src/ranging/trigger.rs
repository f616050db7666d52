// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Unit conversions and echo trigger bands.
//!
//! The host configures triggers in physical units (hundredths of a volt, microseconds). They are
//! converted once into ADC codes and sample indexes so the extraction loop only compares integers.
//! All conversions truncate, matching the host tooling's test vectors.

/// ADC transfer function: `precision_bits` of resolution over `reference_cv` hundredths of a volt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcScale {
    precision_bits: u8,
    reference_cv: u16,
}

impl AdcScale {
    pub const fn new(precision_bits: u8, reference_cv: u16) -> Self {
        Self {
            precision_bits,
            reference_cv,
        }
    }

    #[inline]
    pub const fn precision_bits(&self) -> u8 {
        self.precision_bits
    }

    #[inline]
    pub const fn reference_cv(&self) -> u16 {
        self.reference_cv
    }

    /// Largest code the converter produces, `2^precision - 1`.
    #[inline]
    pub const fn full_scale(&self) -> u32 {
        (1u32 << self.precision_bits) - 1
    }

    /// `code = voltage * (2^precision - 1) / reference`
    pub const fn voltage_to_code(&self, centivolts: u16) -> u16 {
        let code = centivolts as u32 * self.full_scale() / self.reference_cv as u32;
        if code > u16::MAX as u32 {
            u16::MAX
        } else {
            code as u16
        }
    }

    /// `voltage = code * reference / (2^precision - 1)`
    pub const fn code_to_voltage(&self, code: u16) -> u16 {
        (code as u32 * self.reference_cv as u32 / self.full_scale()) as u16
    }

    /// Millivolts at the pin for a raw code.
    pub const fn code_to_millivolts(&self, code: u16) -> u32 {
        code as u32 * self.reference_cv as u32 * 10 / self.full_scale()
    }
}

/// Fixed-rate sampling clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleTiming {
    rate_hz: u32,
}

impl SampleTiming {
    pub const fn new(rate_hz: u32) -> Self {
        Self { rate_hz }
    }

    #[inline]
    pub const fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// `index = time * rate / 1_000_000 - 1`
    ///
    /// A time shorter than one sample period gives `-1`: every sample lies past it.
    pub const fn time_to_index(&self, micros: u16) -> i32 {
        (micros as u64 * self.rate_hz as u64 / 1_000_000) as i32 - 1
    }

    /// `time = 1_000_000 * (index + 1) / rate`, the elapsed microseconds when `index` was taken.
    pub const fn index_to_time(&self, index: usize) -> u32 {
        (1_000_000u64 * (index as u64 + 1) / self.rate_hz as u64) as u32
    }
}

/// Trigger configuration as sent by the host: microseconds and hundredths of a volt.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerSettings {
    pub changeover_us: u16,
    pub near_lower_cv: u16,
    pub near_upper_cv: u16,
    pub far_lower_cv: u16,
    pub far_upper_cv: u16,
}

impl TriggerSettings {
    /// Symmetric bands around `base_cv`.
    pub const fn symmetric(base_cv: u16, near_cv: u16, far_cv: u16, changeover_us: u16) -> Self {
        Self {
            changeover_us,
            near_lower_cv: base_cv.saturating_sub(near_cv),
            near_upper_cv: base_cv.saturating_add(near_cv),
            far_lower_cv: base_cv.saturating_sub(far_cv),
            far_upper_cv: base_cv.saturating_add(far_cv),
        }
    }
}

/// A pair of ADC-code thresholds. The echo input is AC-coupled around a bias, so a sample counts
/// as a detection when it leaves the band in either direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerBand {
    pub lower: u16,
    pub upper: u16,
}

impl TriggerBand {
    #[inline]
    pub const fn is_detection(&self, code: u16) -> bool {
        code <= self.lower || code >= self.upper
    }
}

/// Trigger bands in ADC-code and sample-index units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerConfig {
    /// Last sample index that still uses the near band.
    pub changeover_index: i32,
    pub near: TriggerBand,
    pub far: TriggerBand,
}

impl TriggerConfig {
    pub const fn from_settings(
        settings: &TriggerSettings,
        scale: &AdcScale,
        timing: &SampleTiming,
    ) -> Self {
        Self {
            changeover_index: timing.time_to_index(settings.changeover_us),
            near: TriggerBand {
                lower: scale.voltage_to_code(settings.near_lower_cv),
                upper: scale.voltage_to_code(settings.near_upper_cv),
            },
            far: TriggerBand {
                lower: scale.voltage_to_code(settings.far_lower_cv),
                upper: scale.voltage_to_code(settings.far_upper_cv),
            },
        }
    }

    /// Band in force at `index`: near up to and including the changeover index, far after it.
    #[inline]
    pub fn band_for(&self, index: usize) -> &TriggerBand {
        if (index as i64) <= self.changeover_index as i64 {
            &self.near
        } else {
            &self.far
        }
    }
}
