// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! STM32F777 board support.

pub mod adc;
pub mod pins;
pub mod pulse;
pub mod shared;
pub mod timer;
pub mod usart;

pub use adc::EchoAdc;
pub use pins::BoardPins;
pub use pulse::PulseGenerator;
pub use shared::{BoardAcquisition, Handles, SharedAcquisition, SharedChannel};
pub use timer::SampleTimer;
pub use usart::UsartPort;

use cortex_m::peripheral::{syst::SystClkSource, SYST};
use stm32f7xx_hal::{
    pac,
    prelude::*,
    serial::{Config as SerialConfig, Serial},
};

use crate::config::{Config, HOST_BAUD, PLATFORM_BAUD, PULSE_CARRIER_HZ};
use crate::error::InitError;

/// Bring up clocks, pins, both UARTs, and the acquisition peripherals, then hand them to the
/// interrupt handlers. SysTick is left running at 1 kHz.
pub fn init(dp: pac::Peripherals, syst: &mut SYST, config: &Config) -> Result<Handles, InitError> {
    config.validate()?;

    // Clocks. With the APB buses undivided the timer kernels run at PCLK.
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOD, dp.GPIOE);

    // USART1 (host) and USART2 (platform)
    let uart_cfg = |baud: u32| SerialConfig {
        baud_rate: baud.bps(),
        ..Default::default()
    };
    let host = Serial::new(
        dp.USART1,
        (pins.host.tx, pins.host.rx),
        &clocks,
        uart_cfg(HOST_BAUD),
    );
    let platform = Serial::new(
        dp.USART2,
        (pins.platform.tx, pins.platform.rx),
        &clocks,
        uart_cfg(PLATFORM_BAUD),
    );

    // Acquisition
    let timer = SampleTimer::tim2(dp.TIM2, clocks.pclk1().raw(), config.sample_rate_hz)?;
    let pulse = PulseGenerator::tim1(
        dp.TIM1,
        pins.sonar.burst,
        pins.sonar.mux,
        clocks.pclk2().raw(),
        PULSE_CARRIER_HZ,
    );
    let adc = EchoAdc::adc1(dp.ADC1, pins.sonar.echo);

    // 1 ms tick
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(clocks.sysclk().raw() / 1_000 - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();

    Ok(shared::install(
        UsartPort::new(host),
        UsartPort::new(platform),
        BoardAcquisition { adc, timer, pulse },
    ))
}
