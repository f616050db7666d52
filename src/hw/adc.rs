// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ADC1 support for echo and temperature conversions using direct PAC register access.
//!
//! Conversions are started from the sample-clock interrupt and complete in the ADC interrupt, so
//! nothing here waits on the hardware.
//!
//! Example:
//! ```no_run
//! let mut adc = EchoAdc::adc1(dp.ADC1, pins.sonar.echo);
//! adc.start(ECHO_CHANNEL);
//! // ... in the ADC interrupt:
//! if let Some(code) = adc.take() { /* ... */ }
//! ```

use stm32f7xx_hal::{
    gpio::{gpioa, Analog},
    pac,
};

/// Echo envelope input: PA3 (ADC1_IN3).
pub const ECHO_CHANNEL: u8 = 3;
/// Internal temperature sensor.
pub const TEMPERATURE_CHANNEL: u8 = 18;

pub struct EchoAdc {
    adc: pac::ADC1,
    _echo: gpioa::PA3<Analog>,
}

fn configure_common() {
    let common = unsafe { &*pac::ADC_COMMON::ptr() };

    // ADC prescaler: PCLK2 / 4, temperature sensor on
    common
        .ccr
        .modify(|_, w| w.adcpre().div4().tsvrefe().set_bit());
}

fn init_interrupt_adc(adc: &pac::adc1::RegisterBlock) {
    // Power off to configure
    adc.cr2.modify(|_, w| w.adon().clear_bit());

    // 12-bit, right-aligned, software trigger, end-of-conversion interrupt
    adc.cr1.modify(|_, w| w.res().bits(0b00).eocie().set_bit());
    adc.cr2.modify(|_, w| {
        w.cont().clear_bit();
        w.align().right();
        w.exten().disabled();
        w.eocs().set_bit();
        w
    });

    // Echo: shortest sample time to fit the sample period
    adc.smpr2.modify(|_, w| w.smp3().bits(0b000));
    // Temperature sensor: longest sample time
    adc.smpr1.modify(|_, w| w.smp18().bits(0b111));

    // Sequence length = 1 conversion
    adc.sqr1.modify(|_, w| w.l().bits(0));

    // Power on
    adc.cr2.modify(|_, w| w.adon().set_bit());
}

impl EchoAdc {
    /// Create and initialize ADC1.
    pub fn adc1(adc1: pac::ADC1, echo: gpioa::PA3<Analog>) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.adc1en().set_bit());

        configure_common();
        init_interrupt_adc(&adc1);

        Self {
            adc: adc1,
            _echo: echo,
        }
    }

    /// Begin a single conversion of `channel`. The result arrives in the ADC interrupt.
    pub fn start(&mut self, channel: u8) {
        self.adc
            .sqr3
            .modify(|_, w| unsafe { w.sq1().bits(channel & 0x1F) });
        self.adc.cr2.modify(|_, w| w.swstart().set_bit());
    }

    /// Finished conversion, if any. Reading the data register clears the flag.
    pub fn take(&mut self) -> Option<u16> {
        let sr = self.adc.sr.read();
        if sr.ovr().bit_is_set() {
            self.adc.sr.modify(|_, w| w.ovr().clear_bit());
        }
        if sr.eoc().bit_is_clear() {
            return None;
        }
        Some(self.adc.dr.read().data().bits() as u16)
    }
}
