// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Binary telemetry frames streamed to the host after each scan.
//!
//! ```text
//! FF FF  <pairs...>  7F FF
//! ```
//!
//! Every pair is `[(value & 0xF00) >> 4 | tag, value & 0xFF]`, carrying a 12-bit value and a
//! 4-bit tag. Waveform pairs tag each sample with the sensor index; range pairs tag each reading
//! with its position in the active sensor set. A range of `-1` (no detection) goes out as
//! `F0|tag FF`.
//!
//! A waveform frame for a full array is close to 48 KiB, far more than the transmit ring, so
//! [`TelemetryFrame`] is resumable: each pump queues as much as fits and remembers its offset.

use crate::ranging::{RangingEngine, SensorSet};
use crate::transport::ByteChannel;

pub const FRAME_START: [u8; 2] = [0xFF, 0xFF];
pub const FRAME_END: [u8; 2] = [0x7F, 0xFF];

/// What the host asked to receive after each scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    #[default]
    None,
    Waveform,
    Range,
}

impl OutputMode {
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::None),
            1 => Some(Self::Waveform),
            2 => Some(Self::Range),
            _ => None,
        }
    }
}

/// Pack a 12-bit value and a 4-bit tag into one wire pair.
#[inline]
pub const fn encode_pair(value: u16, tag: u8) -> [u8; 2] {
    [
        (((value & 0x0F00) >> 4) as u8) | (tag & 0x0F),
        (value & 0x00FF) as u8,
    ]
}

/// A frame being streamed out.
#[derive(Debug, Clone)]
pub struct TelemetryFrame {
    mode: OutputMode,
    sensors: SensorSet,
    offset: usize,
    len: usize,
}

impl TelemetryFrame {
    /// Frame for the sensors of the scan that just completed. `None` when output is disabled.
    pub fn new<const N: usize>(mode: OutputMode, sensors: &[u8]) -> Option<Self> {
        let pairs = match mode {
            OutputMode::None => return None,
            OutputMode::Waveform => sensors.len() * N,
            OutputMode::Range => sensors.len(),
        };
        let mut set = SensorSet::new();
        for &s in sensors {
            let _ = set.push(s);
        }
        Some(Self {
            mode,
            sensors: set,
            offset: 0,
            len: FRAME_START.len() + 2 * pairs + FRAME_END.len(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.offset >= self.len
    }

    /// Queue bytes until the frame is complete or the channel has no room. Returns `true` once
    /// the whole frame has been queued.
    pub fn pump<C, const N: usize>(&mut self, engine: &RangingEngine<N>, ch: &mut C) -> bool
    where
        C: ByteChannel + ?Sized,
    {
        while !self.is_done() && ch.tx_free() > 0 {
            let byte = self.byte_at(self.offset, engine);
            if ch.try_send(byte).is_err() {
                break;
            }
            self.offset += 1;
        }
        self.is_done()
    }

    fn byte_at<const N: usize>(&self, offset: usize, engine: &RangingEngine<N>) -> u8 {
        if offset < FRAME_START.len() {
            return FRAME_START[offset];
        }
        let end = self.len - FRAME_END.len();
        if offset >= end {
            return FRAME_END[offset - end];
        }

        let body = offset - FRAME_START.len();
        let pair_index = body / 2;
        let pair = match self.mode {
            OutputMode::Waveform => {
                let sensor = self.sensors[pair_index / N];
                let code = engine
                    .waveform(sensor)
                    .map(|w| w[pair_index % N])
                    .unwrap_or(0);
                encode_pair(code, sensor)
            }
            OutputMode::Range | OutputMode::None => {
                let sensor = self.sensors[pair_index];
                let range = engine.readings().wire_value(sensor) as u16;
                encode_pair(range, pair_index as u8)
            }
        };
        pair[body % 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ranging::ScanMode;
    use crate::testing::{MockChannel, MockHw};

    const SAMPLES: usize = 4;

    fn scanned_engine(sensors: &[u8], code: u16) -> RangingEngine<SAMPLES> {
        let mut engine = RangingEngine::new(&Config::DEFAULT);
        let mut hw = MockHw::default();
        engine.start_scan(ScanMode::Complete, sensors, &mut hw).unwrap();
        while !engine.state().is_fault() && engine.state() != crate::ranging::ScanState::Complete {
            engine.on_sample_tick(&mut hw);
            engine.on_adc_ready(code, &mut hw);
        }
        engine.finish().unwrap();
        engine
    }

    #[test]
    fn pair_packing() {
        assert_eq!(encode_pair(0xABC, 3), [0xA3, 0xBC]);
        assert_eq!(encode_pair(0xFFFF, 1), [0xF1, 0xFF]);
    }

    #[test]
    fn disabled_output_has_no_frame() {
        assert!(TelemetryFrame::new::<SAMPLES>(OutputMode::None, &[0]).is_none());
    }

    #[test]
    fn waveform_frame_layout() {
        let engine = scanned_engine(&[2, 5], 0x7E5);
        let mut frame = TelemetryFrame::new::<SAMPLES>(OutputMode::Waveform, &[2, 5]).unwrap();
        assert_eq!(frame.len(), 4 + 2 * 2 * SAMPLES);

        let mut ch = MockChannel::default();
        assert!(frame.pump(&engine, &mut ch));
        assert_eq!(&ch.sent[..2], &FRAME_START);
        assert_eq!(&ch.sent[2..4], &[0x72, 0xE5]);
        assert_eq!(&ch.sent[2 + 2 * SAMPLES..4 + 2 * SAMPLES], &[0x75, 0xE5]);
        assert_eq!(&ch.sent[ch.sent.len() - 2..], &FRAME_END);
    }

    #[test]
    fn range_frame_tags_set_position() {
        // Full-scale samples trip the near band at index 0: 12 us at 344 m/s is 2 mm.
        let engine = scanned_engine(&[7, 8], 4095);
        let mut frame = TelemetryFrame::new::<SAMPLES>(OutputMode::Range, &[7, 8]).unwrap();
        let mut ch = MockChannel::default();
        assert!(frame.pump(&engine, &mut ch));
        assert_eq!(ch.sent, [0xFF, 0xFF, 0x00, 0x02, 0x01, 0x02, 0x7F, 0xFF]);
    }

    #[test]
    fn no_detection_is_minus_one() {
        let engine = scanned_engine(&[3], 2048);
        let mut frame = TelemetryFrame::new::<SAMPLES>(OutputMode::Range, &[3]).unwrap();
        let mut ch = MockChannel::default();
        frame.pump(&engine, &mut ch);
        assert_eq!(&ch.sent[2..4], &[0xF0, 0xFF]);
    }

    #[test]
    fn resumes_when_channel_fills() {
        let engine = scanned_engine(&[0], 100);
        let mut frame = TelemetryFrame::new::<SAMPLES>(OutputMode::Waveform, &[0]).unwrap();
        let mut ch = MockChannel::default();
        ch.tx_capacity = 5;
        assert!(!frame.pump(&engine, &mut ch));
        assert_eq!(ch.sent.len(), 5);

        let mut all = ch.sent.clone();
        ch.sent.clear();
        ch.tx_capacity = 64;
        assert!(frame.pump(&engine, &mut ch));
        all.extend_from_slice(&ch.sent);
        assert_eq!(all.len(), frame.len());
        assert_eq!(&all[2..4], &[0x00, 100]);
        assert_eq!(&all[all.len() - 2..], &FRAME_END);
    }
}
