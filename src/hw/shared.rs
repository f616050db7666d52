// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! State shared between interrupt handlers and the main loop.
//!
//! Each piece lives in a `cortex_m::interrupt::Mutex<RefCell<_>>` static and is only touched
//! inside a critical section. The main loop gets lightweight handles that implement the
//! [`ByteChannel`] and [`Acquisition`] seams; the interrupt handlers call the `on_*` functions.
//!
//! The ranging engine is const-initialized in place. Its waveform table is far too large to
//! build on the stack and move into the static at runtime.

use core::cell::RefCell;

use cortex_m::interrupt::{self, Mutex};
use stm32f7xx_hal::pac::{self, interrupt as irq, NVIC};

use crate::config::{Config, SAMPLES_PER_SCAN};
use crate::error::TransportError;
use crate::hw::adc::{EchoAdc, ECHO_CHANNEL, TEMPERATURE_CHANNEL};
use crate::hw::pulse::PulseGenerator;
use crate::hw::timer::SampleTimer;
use crate::hw::usart::UsartPort;
use crate::ranging::{Acquisition, AcquisitionHw, AdcChannel, RangingEngine};
use crate::transport::{ByteChannel, SerialChannel, SerialPort};

pub type HostPort = UsartPort<pac::USART1>;
pub type PlatformPort = UsartPort<pac::USART2>;
pub type Engine = RangingEngine<SAMPLES_PER_SCAN>;

type Shared<T> = Mutex<RefCell<Option<T>>>;

static HOST: Shared<SerialChannel<HostPort>> = Mutex::new(RefCell::new(None));
static PLATFORM: Shared<SerialChannel<PlatformPort>> = Mutex::new(RefCell::new(None));
static ENGINE: Mutex<RefCell<Engine>> =
    Mutex::new(RefCell::new(RangingEngine::new(&Config::DEFAULT)));
static ACQ_HW: Shared<BoardAcquisition> = Mutex::new(RefCell::new(None));

/// The acquisition peripherals driven by the ranging engine.
pub struct BoardAcquisition {
    pub adc: EchoAdc,
    pub timer: SampleTimer,
    pub pulse: PulseGenerator,
}

impl AcquisitionHw for BoardAcquisition {
    fn start_conversion(&mut self, channel: AdcChannel) {
        self.adc.start(match channel {
            AdcChannel::Echo => ECHO_CHANNEL,
            AdcChannel::Temperature => TEMPERATURE_CHANNEL,
        });
    }

    fn emit_pulse(&mut self, address: u8, cycles: u8) {
        self.pulse.fire(address, cycles);
    }

    fn start_sample_clock(&mut self) {
        self.timer.start();
    }

    fn stop_sample_clock(&mut self) {
        self.timer.stop();
    }
}

/// Main-loop handle on one of the interrupt-driven serial channels.
pub struct SharedChannel<P: 'static> {
    cell: &'static Shared<SerialChannel<P>>,
}

impl<P: SerialPort> SharedChannel<P> {
    fn with<R>(&self, default: R, f: impl FnOnce(&mut SerialChannel<P>) -> R) -> R {
        interrupt::free(|cs| match self.cell.borrow(cs).borrow_mut().as_mut() {
            Some(ch) => f(ch),
            None => default,
        })
    }
}

impl<P: SerialPort> ByteChannel for SharedChannel<P> {
    fn try_send(&mut self, byte: u8) -> nb::Result<(), TransportError> {
        self.with(Err(nb::Error::WouldBlock), |ch| ch.try_send(byte))
    }

    fn try_recv(&mut self) -> Option<u8> {
        self.with(None, |ch| ch.try_recv())
    }

    fn pending(&self) -> usize {
        self.with(0, |ch| ch.pending())
    }

    fn tx_free(&self) -> usize {
        self.with(0, |ch| ch.tx_free())
    }

    fn take_rx_overflow(&mut self) -> bool {
        self.with(false, |ch| ch.take_rx_overflow())
    }

    fn rx_dropped(&self) -> u32 {
        self.with(0, |ch| ch.rx_dropped())
    }

    fn rx_errors(&self) -> u32 {
        self.with(0, |ch| ch.rx_errors())
    }
}

/// Main-loop handle on the ranging engine and its peripherals.
pub struct SharedAcquisition {
    _private: (),
}

impl Acquisition<SAMPLES_PER_SCAN> for SharedAcquisition {
    type Hw = Option<BoardAcquisition>;

    fn with_engine<R>(&mut self, f: impl FnOnce(&mut Engine, &mut Self::Hw) -> R) -> R {
        interrupt::free(|cs| {
            let mut engine = ENGINE.borrow(cs).borrow_mut();
            let mut hw = ACQ_HW.borrow(cs).borrow_mut();
            f(&mut engine, &mut hw)
        })
    }
}

/// Handles returned once the peripherals are installed.
pub struct Handles {
    pub host: SharedChannel<HostPort>,
    pub platform: SharedChannel<PlatformPort>,
    pub acquisition: SharedAcquisition,
}

/// Move the peripherals into the shared statics and unmask their interrupts.
pub fn install(host: HostPort, platform: PlatformPort, acquisition: BoardAcquisition) -> Handles {
    interrupt::free(|cs| {
        HOST.borrow(cs).replace(Some(SerialChannel::new(host)));
        PLATFORM.borrow(cs).replace(Some(SerialChannel::new(platform)));
        ACQ_HW.borrow(cs).replace(Some(acquisition));
    });

    unsafe {
        NVIC::unmask(irq::USART1);
        NVIC::unmask(irq::USART2);
        NVIC::unmask(irq::TIM2);
        NVIC::unmask(irq::ADC);
    }

    Handles {
        host: SharedChannel { cell: &HOST },
        platform: SharedChannel { cell: &PLATFORM },
        acquisition: SharedAcquisition { _private: () },
    }
}

/// USART1 interrupt body.
pub fn on_host_uart() {
    interrupt::free(|cs| {
        if let Some(ch) = HOST.borrow(cs).borrow_mut().as_mut() {
            ch.on_interrupt();
        }
    });
}

/// USART2 interrupt body.
pub fn on_platform_uart() {
    interrupt::free(|cs| {
        if let Some(ch) = PLATFORM.borrow(cs).borrow_mut().as_mut() {
            ch.on_interrupt();
        }
    });
}

/// TIM2 update interrupt body.
pub fn on_sample_tick() {
    interrupt::free(|cs| {
        let mut hw = ACQ_HW.borrow(cs).borrow_mut();
        if !hw.as_mut().map_or(false, |board| board.timer.clear_update()) {
            return;
        }
        ENGINE.borrow(cs).borrow_mut().on_sample_tick(&mut *hw);
    });
}

/// ADC end-of-conversion interrupt body.
pub fn on_adc() {
    interrupt::free(|cs| {
        let mut hw = ACQ_HW.borrow(cs).borrow_mut();
        let Some(code) = hw.as_mut().and_then(|board| board.adc.take()) else {
            return;
        };
        ENGINE.borrow(cs).borrow_mut().on_adc_ready(code, &mut *hw);
    });
}
