// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Scan state machine.
//!
//! A scan walks the active sensor set in order. For each sensor the engine fires a pulse burst,
//! starts the sample clock and then alternates between two interrupt-driven steps:
//!
//! - sample-clock tick in `AdcRequest`: start one conversion, go to `AdcResponse`
//! - ADC ready in `AdcResponse`: store the code, go back to `AdcRequest`
//!
//! Either event arriving in the other state means a conversion overran its sample period. The
//! engine stops the clock and parks in one of the two error states until [`RangingEngine::reset`].
//!
//! Extraction runs from task context in [`RangingEngine::finish`], never from an interrupt.

use heapless::Vec;

use crate::config::{Config, MAX_SENSORS, SAMPLES_PER_SCAN};
use crate::error::ScanError;
use crate::ranging::calibration::{SensorCalibration, TemperatureModel};
use crate::ranging::extract::extract_range;
use crate::ranging::table::{RangeReadings, WaveformTable};
use crate::ranging::trigger::{AdcScale, SampleTiming, TriggerConfig, TriggerSettings};

/// Ordered sensor indexes visited by one scan.
pub type SensorSet = Vec<u8, MAX_SENSORS>;

/// Which sensors a scan visits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanMode {
    /// One selected sensor.
    Single,
    /// Every installed sensor, in index order.
    Complete,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    Idle,
    /// Waiting for the sample clock to request the next conversion.
    AdcRequest,
    /// A conversion is in flight.
    AdcResponse,
    /// Temperature conversion in flight.
    Temp,
    /// Results ready for [`RangingEngine::finish`].
    Complete,
    /// The sample clock fired before the previous conversion finished.
    AdcErrorRequest,
    /// A conversion finished that was never requested.
    AdcErrorResponse,
}

impl ScanState {
    #[inline]
    pub const fn is_fault(self) -> bool {
        matches!(self, Self::AdcErrorRequest | Self::AdcErrorResponse)
    }

    /// Upper-case name used in host debug text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::AdcRequest => "ADC REQUEST",
            Self::AdcResponse => "ADC RESPONSE",
            Self::Temp => "TEMP",
            Self::Complete => "COMPLETE",
            Self::AdcErrorRequest => "ADC ERROR REQUEST",
            Self::AdcErrorResponse => "ADC ERROR RESPONSE",
        }
    }
}

/// Input routed to the converter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    /// Receive amplifier of whichever transducer the mux currently selects.
    Echo,
    /// On-die temperature sensor.
    Temperature,
}

/// Peripherals the engine drives.
///
/// Every call is made from the engine's own context (task or acquisition interrupt) and must
/// return without waiting on the hardware.
pub trait AcquisitionHw {
    /// Begin one conversion. Completion is reported through [`RangingEngine::on_adc_ready`].
    fn start_conversion(&mut self, channel: AdcChannel);

    /// Route the mux to `address` and fire a burst of `cycles` carrier cycles.
    fn emit_pulse(&mut self, address: u8, cycles: u8);

    /// Start the periodic sample clock. Each tick is reported through
    /// [`RangingEngine::on_sample_tick`].
    fn start_sample_clock(&mut self);

    fn stop_sample_clock(&mut self);
}

/// Hardware that may not be installed yet. Every call is a no-op until it is.
impl<T: AcquisitionHw> AcquisitionHw for Option<T> {
    fn start_conversion(&mut self, channel: AdcChannel) {
        if let Some(hw) = self {
            hw.start_conversion(channel);
        }
    }

    fn emit_pulse(&mut self, address: u8, cycles: u8) {
        if let Some(hw) = self {
            hw.emit_pulse(address, cycles);
        }
    }

    fn start_sample_clock(&mut self) {
        if let Some(hw) = self {
            hw.start_sample_clock();
        }
    }

    fn stop_sample_clock(&mut self) {
        if let Some(hw) = self {
            hw.stop_sample_clock();
        }
    }
}

/// Task-side access to an engine and its hardware.
///
/// On the board both live in interrupt-shared cells and each call runs inside a critical section.
/// Tests implement it on a plain struct.
pub trait Acquisition<const N: usize> {
    type Hw: AcquisitionHw;

    fn with_engine<R>(&mut self, f: impl FnOnce(&mut RangingEngine<N>, &mut Self::Hw) -> R) -> R;
}

/// What a scan session is measuring.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Job {
    Ranging(ScanMode),
    Temperature,
}

/// Cursor state of the scan in progress, or of the last one.
#[derive(Clone, Debug)]
pub struct ScanSession {
    sensors: SensorSet,
    cursor: usize,
    sample: usize,
    job: Job,
}

impl ScanSession {
    const fn new() -> Self {
        Self {
            sensors: Vec::new(),
            cursor: 0,
            sample: 0,
            job: Job::Temperature,
        }
    }

    #[inline]
    pub fn sensors(&self) -> &[u8] {
        &self.sensors
    }

    /// Sensor being sampled.
    #[inline]
    pub fn current_sensor(&self) -> Option<u8> {
        self.sensors.get(self.cursor).copied()
    }

    #[inline]
    pub fn sample_index(&self) -> usize {
        self.sample
    }

    /// `None` for a temperature read.
    #[inline]
    pub fn mode(&self) -> Option<ScanMode> {
        match self.job {
            Job::Ranging(mode) => Some(mode),
            Job::Temperature => None,
        }
    }
}

/// Result handed back by [`RangingEngine::finish`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completed {
    /// Range readings for the scanned sensors were updated.
    Scan,
    /// New air temperature in tenths of a degree Celsius.
    Temperature(i16),
}

/// Acquisition engine with `N` samples per sensor.
pub struct RangingEngine<const N: usize = SAMPLES_PER_SCAN> {
    state: ScanState,
    session: ScanSession,
    waveforms: WaveformTable<N>,
    readings: RangeReadings,
    settings: TriggerSettings,
    triggers: TriggerConfig,
    scale: AdcScale,
    timing: SampleTiming,
    calibration: SensorCalibration,
    temperature_model: TemperatureModel,
    temperature_deci_c: i16,
    sensor_count: u8,
    sensor_addresses: [u8; MAX_SENSORS],
    pulse_cycles: u8,
}

impl<const N: usize> RangingEngine<N> {
    pub const fn new(config: &Config) -> Self {
        let timing = config.timing();
        Self {
            state: ScanState::Idle,
            session: ScanSession::new(),
            waveforms: WaveformTable::new(),
            readings: RangeReadings::new(),
            settings: config.triggers,
            triggers: TriggerConfig::from_settings(&config.triggers, &config.adc, &timing),
            scale: config.adc,
            timing,
            calibration: config.calibration,
            temperature_model: config.temperature_model,
            temperature_deci_c: config.default_temperature_deci_c,
            sensor_count: config.sensor_count,
            sensor_addresses: config.sensor_addresses,
            pulse_cycles: config.pulse_cycles,
        }
    }

    #[inline]
    pub fn state(&self) -> ScanState {
        self.state
    }

    #[inline]
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    #[inline]
    pub fn readings(&self) -> &RangeReadings {
        &self.readings
    }

    /// Raw samples for `sensor`. Only meaningful once a scan covering it reached `Complete`.
    #[inline]
    pub fn waveform(&self, sensor: u8) -> Option<&[u16; N]> {
        self.waveforms.waveform(sensor)
    }

    #[inline]
    pub fn triggers(&self) -> &TriggerConfig {
        &self.triggers
    }

    #[inline]
    pub fn trigger_settings(&self) -> &TriggerSettings {
        &self.settings
    }

    #[inline]
    pub fn temperature_deci_c(&self) -> i16 {
        self.temperature_deci_c
    }

    #[inline]
    pub fn sensor_count(&self) -> u8 {
        self.sensor_count
    }

    /// Replace the trigger bands used by subsequent extractions.
    pub fn set_triggers(&mut self, settings: TriggerSettings) {
        self.settings = settings;
        self.triggers = TriggerConfig::from_settings(&settings, &self.scale, &self.timing);
    }

    pub fn set_calibration(&mut self, calibration: SensorCalibration) {
        self.calibration = calibration;
    }

    /// Begin sampling `sensors` in order.
    pub fn start_scan<H: AcquisitionHw>(
        &mut self,
        mode: ScanMode,
        sensors: &[u8],
        hw: &mut H,
    ) -> Result<(), ScanError> {
        if self.state != ScanState::Idle {
            return Err(ScanError::Busy(self.state));
        }
        let first = *sensors.first().ok_or(ScanError::EmptySensorSet)?;
        if let Some(&bad) = sensors.iter().find(|&&s| s >= self.sensor_count) {
            return Err(ScanError::InvalidSensor(bad));
        }

        self.session.sensors.clear();
        // Entries past the array size are ignored.
        for &s in sensors.iter().take(MAX_SENSORS) {
            let _ = self.session.sensors.push(s);
        }
        self.session.cursor = 0;
        self.session.sample = 0;
        self.session.job = Job::Ranging(mode);

        self.arm_sensor(first, hw);
        Ok(())
    }

    /// Begin a temperature conversion.
    pub fn start_temperature<H: AcquisitionHw>(&mut self, hw: &mut H) -> Result<(), ScanError> {
        if self.state != ScanState::Idle {
            return Err(ScanError::Busy(self.state));
        }
        self.session.job = Job::Temperature;
        self.state = ScanState::Temp;
        hw.start_conversion(AdcChannel::Temperature);
        Ok(())
    }

    /// Sample clock interrupt.
    pub fn on_sample_tick<H: AcquisitionHw>(&mut self, hw: &mut H) {
        match self.state {
            ScanState::AdcRequest => {
                self.state = ScanState::AdcResponse;
                hw.start_conversion(AdcChannel::Echo);
            }
            ScanState::AdcResponse => {
                hw.stop_sample_clock();
                self.state = ScanState::AdcErrorRequest;
                warn!(
                    "conversion overran sample period at sample {=usize}",
                    self.session.sample
                );
            }
            _ => {}
        }
    }

    /// End-of-conversion interrupt with the raw code.
    pub fn on_adc_ready<H: AcquisitionHw>(&mut self, code: u16, hw: &mut H) {
        match self.state {
            ScanState::AdcResponse => {
                let Some(sensor) = self.session.current_sensor() else {
                    hw.stop_sample_clock();
                    self.state = ScanState::AdcErrorResponse;
                    return;
                };
                self.waveforms.store(sensor, self.session.sample, code);
                self.session.sample += 1;
                if self.session.sample < N {
                    self.state = ScanState::AdcRequest;
                    return;
                }

                hw.stop_sample_clock();
                self.session.cursor += 1;
                self.session.sample = 0;
                match self.session.current_sensor() {
                    Some(next) => self.arm_sensor(next, hw),
                    None => self.state = ScanState::Complete,
                }
            }
            ScanState::AdcRequest => {
                hw.stop_sample_clock();
                self.state = ScanState::AdcErrorResponse;
                warn!("unexpected conversion result {=u16}", code);
            }
            ScanState::Temp => {
                self.temperature_deci_c = self.temperature_model.deci_celsius(code, &self.scale);
                self.state = ScanState::Complete;
            }
            _ => {}
        }
    }

    /// The temperature conversion outlived its window. Enters `AdcErrorResponse` and returns
    /// `true` if one was outstanding.
    pub fn time_out_temperature(&mut self) -> bool {
        if self.state != ScanState::Temp {
            return false;
        }
        self.state = ScanState::AdcErrorResponse;
        warn!("temperature conversion never completed");
        true
    }

    /// Consume a completed session.
    ///
    /// For a ranging scan this runs extraction over every sensor in the active set and leaves the
    /// readings of all other sensors untouched.
    pub fn finish(&mut self) -> Result<Completed, ScanError> {
        if self.state != ScanState::Complete {
            return Err(ScanError::NotComplete(self.state));
        }
        self.state = ScanState::Idle;

        match self.session.job {
            Job::Temperature => Ok(Completed::Temperature(self.temperature_deci_c)),
            Job::Ranging(_) => {
                for &sensor in self.session.sensors.iter() {
                    let range = self.waveforms.waveform(sensor).and_then(|samples| {
                        extract_range(
                            samples,
                            &self.triggers,
                            &self.timing,
                            self.temperature_deci_c,
                            self.calibration.offset_mm(sensor),
                        )
                    });
                    self.readings.set(sensor, range);
                }
                debug!("scan of {=usize} sensors complete", self.session.sensors.len());
                Ok(Completed::Scan)
            }
        }
    }

    /// Abandon whatever is in progress and return to `Idle`. Clears the fault states.
    pub fn reset<H: AcquisitionHw>(&mut self, hw: &mut H) {
        hw.stop_sample_clock();
        self.session.cursor = 0;
        self.session.sample = 0;
        self.state = ScanState::Idle;
    }

    fn arm_sensor<H: AcquisitionHw>(&mut self, sensor: u8, hw: &mut H) {
        let address = self.sensor_addresses[sensor as usize % MAX_SENSORS];
        hw.emit_pulse(address, self.pulse_cycles);
        self.state = ScanState::AdcRequest;
        hw.start_sample_clock();
    }
}
