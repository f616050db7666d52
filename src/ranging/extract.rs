// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Time-of-flight extraction from a stored waveform.

use crate::ranging::calibration::speed_of_sound;
use crate::ranging::trigger::{SampleTiming, TriggerConfig};

/// Index of the first sample that leaves the trigger band in force at that index.
pub fn first_detection(samples: &[u16], triggers: &TriggerConfig) -> Option<usize> {
    samples
        .iter()
        .enumerate()
        .find(|(i, code)| triggers.band_for(*i).is_detection(**code))
        .map(|(i, _)| i)
}

/// One-way distance in millimetres for an echo first detected at `index`.
///
/// `elapsed_us * speed / (1000 * 2) + offset`, truncating like the host-side model.
pub fn distance_mm(
    index: usize,
    timing: &SampleTiming,
    temperature_deci_c: i16,
    offset_mm: i16,
) -> i16 {
    let elapsed_us = timing.index_to_time(index) as i64;
    let speed = speed_of_sound(temperature_deci_c) as i64;
    let mm = elapsed_us * speed / (1000 * 2) + offset_mm as i64;
    mm.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Range for one waveform, or `None` when nothing crosses the bands.
pub fn extract_range(
    samples: &[u16],
    triggers: &TriggerConfig,
    timing: &SampleTiming,
    temperature_deci_c: i16,
    offset_mm: i16,
) -> Option<i16> {
    first_detection(samples, triggers)
        .map(|index| distance_mm(index, timing, temperature_deci_c, offset_mm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::trigger::TriggerBand;

    const TIMING: SampleTiming = SampleTiming::new(80_000);
    const BIAS: u16 = 2048;

    fn triggers(changeover_index: i32) -> TriggerConfig {
        TriggerConfig {
            changeover_index,
            near: TriggerBand {
                lower: 1500,
                upper: 2600,
            },
            far: TriggerBand {
                lower: 1900,
                upper: 2200,
            },
        }
    }

    #[test]
    fn documented_example() {
        let mut samples = [BIAS; 200];
        samples[100] = 2700;
        let range = extract_range(&samples, &triggers(50), &TIMING, 210, 0);
        // elapsed 1262 us at 344 m/s: 1262 * 344 / 2000 = 217
        assert_eq!(range, Some(217));
        assert_eq!(extract_range(&samples, &triggers(50), &TIMING, 210, 10), Some(227));
        assert_eq!(extract_range(&samples, &triggers(50), &TIMING, 210, -20), Some(197));
    }

    #[test]
    fn first_crossing_wins() {
        let mut samples = [BIAS; 200];
        samples[120] = 100;
        samples[60] = 4000;
        assert_eq!(first_detection(&samples, &triggers(10)), Some(60));
    }

    #[test]
    fn near_band_applies_through_changeover_index() {
        let mut samples = [BIAS; 200];
        // Inside the near band, outside the far band.
        samples[40] = 2300;
        assert_eq!(first_detection(&samples, &triggers(40)), None);
        assert_eq!(first_detection(&samples, &triggers(39)), Some(40));
    }

    #[test]
    fn quiet_waveform_has_no_range() {
        let samples = [BIAS; 200];
        assert_eq!(extract_range(&samples, &triggers(50), &TIMING, 210, 0), None);
    }

    #[test]
    fn colder_air_shortens_distance() {
        let warm = distance_mm(400, &TIMING, 300, 0);
        let cold = distance_mm(400, &TIMING, -50, 0);
        assert!(cold < warm);
    }
}
