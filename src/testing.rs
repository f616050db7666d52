// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-side stand-ins for the board peripherals.

use core::convert::Infallible;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::error::{PortError, TransportError};
use crate::ranging::{Acquisition, AcquisitionHw, AdcChannel, RangingEngine};
use crate::transport::{ByteChannel, SerialPort};

/// UART with a scripted receive queue and a recording transmitter.
#[derive(Debug)]
pub struct MockPort {
    pub incoming: VecDeque<Result<u8, PortError>>,
    pub sent: Vec<u8>,
    pub tx_ready: bool,
    pub tx_listening: bool,
}

impl Default for MockPort {
    fn default() -> Self {
        Self {
            incoming: VecDeque::new(),
            sent: Vec::new(),
            tx_ready: true,
            tx_listening: false,
        }
    }
}

impl SerialPort for MockPort {
    fn read(&mut self) -> nb::Result<u8, PortError> {
        match self.incoming.pop_front() {
            Some(Ok(b)) => Ok(b),
            Some(Err(e)) => Err(nb::Error::Other(e)),
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        if !self.tx_ready {
            return Err(nb::Error::WouldBlock);
        }
        self.sent.push(byte);
        Ok(())
    }

    fn is_tx_idle(&self) -> bool {
        self.tx_ready
    }

    fn listen_tx(&mut self, enable: bool) {
        self.tx_listening = enable;
    }
}

/// Buffered channel without a port behind it. `sent` counts against `tx_capacity` until the test
/// clears it.
#[derive(Debug)]
pub struct MockChannel {
    pub input: VecDeque<u8>,
    pub sent: Vec<u8>,
    pub tx_capacity: usize,
    pub rx_overflow: bool,
    pub rx_dropped: u32,
    pub rx_errors: u32,
}

impl MockChannel {
    pub fn with_input(bytes: &[u8]) -> Self {
        let mut ch = Self::default();
        ch.receive(bytes);
        ch
    }

    pub fn receive(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self {
            input: VecDeque::new(),
            sent: Vec::new(),
            tx_capacity: usize::MAX,
            rx_overflow: false,
            rx_dropped: 0,
            rx_errors: 0,
        }
    }
}

impl ByteChannel for MockChannel {
    fn try_send(&mut self, byte: u8) -> nb::Result<(), TransportError> {
        if self.sent.len() >= self.tx_capacity {
            return Err(nb::Error::WouldBlock);
        }
        self.sent.push(byte);
        Ok(())
    }

    fn try_recv(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn pending(&self) -> usize {
        self.input.len()
    }

    fn tx_free(&self) -> usize {
        self.tx_capacity.saturating_sub(self.sent.len())
    }

    fn take_rx_overflow(&mut self) -> bool {
        core::mem::replace(&mut self.rx_overflow, false)
    }

    fn rx_dropped(&self) -> u32 {
        self.rx_dropped
    }

    fn rx_errors(&self) -> u32 {
        self.rx_errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwEvent {
    Convert(AdcChannel),
    Pulse { address: u8, cycles: u8 },
    ClockStart,
    ClockStop,
}

/// Acquisition peripherals that record every call.
#[derive(Debug, Default)]
pub struct MockHw {
    pub events: Vec<HwEvent>,
    pub clock_running: bool,
}

impl MockHw {
    pub fn conversions(&self, channel: AdcChannel) -> usize {
        self.events
            .iter()
            .filter(|e| **e == HwEvent::Convert(channel))
            .count()
    }
}

impl AcquisitionHw for MockHw {
    fn start_conversion(&mut self, channel: AdcChannel) {
        self.events.push(HwEvent::Convert(channel));
    }

    fn emit_pulse(&mut self, address: u8, cycles: u8) {
        self.events.push(HwEvent::Pulse { address, cycles });
    }

    fn start_sample_clock(&mut self) {
        self.clock_running = true;
        self.events.push(HwEvent::ClockStart);
    }

    fn stop_sample_clock(&mut self) {
        self.clock_running = false;
        self.events.push(HwEvent::ClockStop);
    }
}

/// Engine and hardware owned together, standing in for the interrupt-shared board state.
pub struct Rig<const N: usize> {
    pub engine: RangingEngine<N>,
    pub hw: MockHw,
}

impl<const N: usize> Rig<N> {
    pub fn new(config: &crate::config::Config) -> Self {
        Self {
            engine: RangingEngine::new(config),
            hw: MockHw::default(),
        }
    }

    /// Play the sample-clock and ADC interrupts until the engine stops sampling, answering each
    /// conversion with `code(sensor, sample_index)`.
    pub fn run_scan(&mut self, code: impl Fn(u8, usize) -> u16) {
        use crate::ranging::ScanState;
        while matches!(
            self.engine.state(),
            ScanState::AdcRequest | ScanState::AdcResponse
        ) {
            self.engine.on_sample_tick(&mut self.hw);
            let sensor = self.engine.session().current_sensor().unwrap_or(0);
            let sample = self.engine.session().sample_index();
            self.engine.on_adc_ready(code(sensor, sample), &mut self.hw);
        }
    }

    /// Answer an outstanding temperature conversion.
    pub fn answer_temperature(&mut self, code: u16) {
        self.engine.on_adc_ready(code, &mut self.hw);
    }
}

impl<const N: usize> Acquisition<N> for Rig<N> {
    type Hw = MockHw;

    fn with_engine<R>(&mut self, f: impl FnOnce(&mut RangingEngine<N>, &mut MockHw) -> R) -> R {
        f(&mut self.engine, &mut self.hw)
    }
}
