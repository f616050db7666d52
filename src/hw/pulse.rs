// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Transmit burst generator.
//!
//! TIM1 CH1 (PE9) runs PWM at the carrier frequency in one-pulse mode; the repetition counter
//! sets how many carrier cycles go out before the counter stops itself. Four GPIO lines select
//! which transducer the burst and the echo path are routed to.

use stm32f7xx_hal::{
    gpio::{gpioe, Alternate, ErasedPin, Output, PushPull},
    pac,
};

pub type MuxLine = ErasedPin<Output<PushPull>>;

pub struct PulseGenerator {
    tim: pac::TIM1,
    _burst: gpioe::PE9<Alternate<1>>,
    mux: [MuxLine; 4],
}

impl PulseGenerator {
    /// Configure TIM1 for carrier bursts at `carrier_hz`, clocked from `timer_hz`.
    pub fn tim1(
        tim1: pac::TIM1,
        burst: gpioe::PE9<Alternate<1>>,
        mux: [MuxLine; 4],
        timer_hz: u32,
        carrier_hz: u32,
    ) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.tim1en().set_bit());

        let tim = tim1;
        let period = (timer_hz / carrier_hz).clamp(2, 0x1_0000);

        // Disable counter while configuring; stop at the end of the burst
        tim.cr1
            .modify(|_, w| w.cen().clear_bit().opm().set_bit().urs().set_bit());

        tim.psc.write(|w| w.psc().bits(0));
        tim.arr.write(|w| w.arr().bits((period - 1) as u16));

        // PWM mode 1, 50% duty, preload on
        tim.ccmr1_output()
            .modify(|_, w| w.oc1m().pwm_mode1().oc1pe().set_bit());
        tim.ccr1.write(|w| w.ccr().bits((period / 2) as u16));
        tim.ccer.modify(|_, w| w.cc1p().clear_bit().cc1e().set_bit());

        // Advanced timer: main output enable
        tim.bdtr.modify(|_, w| w.moe().set_bit());

        let mut pulse = Self {
            tim,
            _burst: burst,
            mux,
        };
        pulse.select(0);
        pulse
    }

    /// Drive the four mux address lines.
    pub fn select(&mut self, address: u8) {
        for (bit, line) in self.mux.iter_mut().enumerate() {
            if address & (1 << bit) != 0 {
                line.set_high();
            } else {
                line.set_low();
            }
        }
    }

    /// Route to `address` and emit `cycles` carrier periods.
    pub fn fire(&mut self, address: u8, cycles: u8) {
        self.select(address);

        let tim = &self.tim;
        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.rcr
            .write(|w| w.rep().bits(cycles.saturating_sub(1) as u16));
        // Load the repetition count and restart the period
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.modify(|_, w| w.uif().clear_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());
    }
}
