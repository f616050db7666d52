// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Sample clock on TIM2.
//!
//! TIM2 counts at the APB1 timer clock and raises an update interrupt once per sample period.
//! The counter only runs while a scan is sampling.

use stm32f7xx_hal::pac;

use crate::error::InitError;

pub struct SampleTimer {
    tim: pac::TIM2,
}

impl SampleTimer {
    /// Configure TIM2 to interrupt at `sample_hz`. The counter is left stopped.
    pub fn tim2(tim2: pac::TIM2, timer_hz: u32, sample_hz: u32) -> Result<Self, InitError> {
        let ticks = match timer_hz.checked_div(sample_hz) {
            Some(t) if t >= 2 => t,
            _ => return Err(InitError::SampleClock { timer_hz, sample_hz }),
        };

        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim2en().set_bit());

        let tim = tim2;

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit().urs().set_bit());

        // No prescale, one update per sample period
        tim.psc.write(|w| w.psc().bits(0));
        tim.arr.write(|w| w.bits(ticks - 1));

        // Latch the registers, then drop the update flag that generated
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.modify(|_, w| w.uif().clear_bit());

        tim.dier.modify(|_, w| w.uie().set_bit());

        Ok(Self { tim })
    }

    /// Restart the counter from zero.
    #[inline]
    pub fn start(&mut self) {
        self.tim.cnt.write(|w| w.bits(0));
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    #[inline]
    pub fn stop(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
    }

    /// Acknowledge an update interrupt. Returns `false` for a spurious entry.
    #[inline]
    pub fn clear_update(&mut self) -> bool {
        if self.tim.sr.read().uif().bit_is_clear() {
            return false;
        }
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        true
    }
}
