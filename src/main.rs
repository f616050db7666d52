// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m_rt::{entry, exception};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

use stm32f7xx_hal::pac::{self, interrupt};

use sonar_array::{error::InitError, hw, Config, SonarApp};

/// Milliseconds elapsed since the main loop last looked.
static TICKS: AtomicU32 = AtomicU32::new(0);

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    let config = Config::DEFAULT;
    let hw::Handles {
        mut host,
        mut platform,
        mut acquisition,
    } = match hw::init(dp, &mut cp.SYST, &config) {
        Ok(handles) => handles,
        Err(e) => halt(e),
    };
    let mut app = match SonarApp::new(config) {
        Ok(app) => app,
        Err(e) => halt(e.into()),
    };

    app.boot(&mut host, &mut platform);

    loop {
        for _ in 0..TICKS.swap(0, Ordering::Relaxed) {
            app.on_tick();
        }
        app.poll(&mut host, &mut platform, &mut acquisition);
    }
}

fn halt(e: InitError) -> ! {
    #[cfg(feature = "defmt")]
    defmt::error!("init failed: {}", e);
    #[cfg(not(feature = "defmt"))]
    let _ = e;
    panic!("init failed");
}

#[exception]
fn SysTick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

#[interrupt]
fn USART1() {
    hw::shared::on_host_uart();
}

#[interrupt]
fn USART2() {
    hw::shared::on_platform_uart();
}

#[interrupt]
fn TIM2() {
    hw::shared::on_sample_tick();
}

#[interrupt]
fn ADC() {
    hw::shared::on_adc();
}
