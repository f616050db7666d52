// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Storage for raw waveforms and the latest range readings.

use crate::config::MAX_SENSORS;

/// Raw ADC codes per sensor, `N` samples each.
pub struct WaveformTable<const N: usize> {
    samples: [[u16; N]; MAX_SENSORS],
}

impl<const N: usize> WaveformTable<N> {
    pub const fn new() -> Self {
        Self {
            samples: [[0; N]; MAX_SENSORS],
        }
    }

    /// Samples recorded for `sensor`, or `None` for an index outside the array.
    #[inline]
    pub fn waveform(&self, sensor: u8) -> Option<&[u16; N]> {
        self.samples.get(sensor as usize)
    }

    #[inline]
    pub(crate) fn store(&mut self, sensor: u8, index: usize, code: u16) {
        if let Some(slot) = self
            .samples
            .get_mut(sensor as usize)
            .and_then(|w| w.get_mut(index))
        {
            *slot = code;
        }
    }
}

impl<const N: usize> Default for WaveformTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire value for "nothing detected".
pub const NO_DETECTION: i16 = -1;

/// Latest one-way distance per sensor in millimetres. `None` means no echo crossed the trigger
/// bands in the whole sampling window, or the sensor has never been scanned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeReadings {
    readings: [Option<i16>; MAX_SENSORS],
}

impl RangeReadings {
    pub const fn new() -> Self {
        Self {
            readings: [None; MAX_SENSORS],
        }
    }

    #[inline]
    pub fn get(&self, sensor: u8) -> Option<i16> {
        self.readings.get(sensor as usize).copied().flatten()
    }

    /// Reading as sent on the wire, with [`NO_DETECTION`] standing in for `None`.
    #[inline]
    pub fn wire_value(&self, sensor: u8) -> i16 {
        self.get(sensor).unwrap_or(NO_DETECTION)
    }

    pub(crate) fn set(&mut self, sensor: u8, reading: Option<i16>) {
        if let Some(slot) = self.readings.get_mut(sensor as usize) {
            *slot = reading;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Option<i16>)> + '_ {
        self.readings
            .iter()
            .enumerate()
            .map(|(i, r)| (i as u8, *r))
    }
}

impl Default for RangeReadings {
    fn default() -> Self {
        Self::new()
    }
}
