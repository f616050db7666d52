// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 sonar array board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiod, gpioe, Alternate, Analog},
    pac,
    prelude::*,
};

use crate::hw::pulse::MuxLine;

/// All board pins. Construct this once at startup using:
///
/// ```rust
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOD, dp.GPIOE);
/// ```
pub struct BoardPins {
    pub host: HostUartPins,
    pub platform: PlatformUartPins,
    pub sonar: SonarPins,
}

/// USART1 to the host (debug USB bridge).
pub struct HostUartPins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// USART2 to the motion platform.
pub struct PlatformUartPins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// Transducer drive, mux select, and echo input.
pub struct SonarPins {
    pub burst: gpioe::PE9<Alternate<1>>, // TIM1_CH1
    pub echo: gpioa::PA3<Analog>,        // ADC1_IN3
    pub mux: [MuxLine; 4],               // PD0..PD3, LSB first
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiod: pac::GPIOD, gpioe: pac::GPIOE) -> Self {
        let gpioa = gpioa.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();

        Self {
            host: HostUartPins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            platform: PlatformUartPins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            sonar: SonarPins {
                burst: gpioe.pe9.into_alternate::<1>(),
                echo: gpioa.pa3.into_analog(),
                mux: [
                    gpiod.pd0.into_push_pull_output().erase(),
                    gpiod.pd1.into_push_pull_output().erase(),
                    gpiod.pd2.into_push_pull_output().erase(),
                    gpiod.pd3.into_push_pull_output().erase(),
                ],
            },
        }
    }
}
