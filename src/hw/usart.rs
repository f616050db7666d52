// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-driven USART port.
//!
//! Wraps the split HAL serial halves and exposes them as a [`SerialPort`]. The receive interrupt
//! is enabled permanently; the transmit-empty interrupt is switched on only while the channel
//! above has bytes queued.
//!
//! To watch the host link from a workstation, connect to the debug USB port and use
//! ```
//! $ screen /dev/tty.usbmodem* 115200
//! ```

use core::convert::Infallible;

use stm32f7xx_hal::{
    pac,
    prelude::*,
    serial::{self, Instance, Pins, Rx, Serial, Tx},
};

use crate::error::PortError;
use crate::transport::SerialPort;

/// Register access for the USART instances this board uses.
pub trait UsartRegs: Instance {
    fn regs() -> &'static pac::usart1::RegisterBlock;
}

impl UsartRegs for pac::USART1 {
    #[inline]
    fn regs() -> &'static pac::usart1::RegisterBlock {
        unsafe { &*pac::USART1::ptr() }
    }
}

impl UsartRegs for pac::USART2 {
    #[inline]
    fn regs() -> &'static pac::usart1::RegisterBlock {
        unsafe { &*pac::USART2::ptr() }
    }
}

pub struct UsartPort<U: UsartRegs> {
    tx: Tx<U>,
    rx: Rx<U>,
}

impl<U: UsartRegs> UsartPort<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, rx) = serial.split();
        U::regs().cr1.modify(|_, w| w.rxneie().set_bit());
        Self { tx, rx }
    }
}

impl<U: UsartRegs> SerialPort for UsartPort<U> {
    fn read(&mut self) -> nb::Result<u8, PortError> {
        self.rx.read().map_err(|e| {
            e.map(|e| match e {
                serial::Error::Overrun => PortError::Overrun,
                serial::Error::Noise => PortError::Noise,
                serial::Error::Parity => PortError::Parity,
                _ => PortError::Framing,
            })
        })
    }

    #[inline]
    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        self.tx.write(byte).map_err(|_| nb::Error::WouldBlock)
    }

    #[inline]
    fn is_tx_idle(&self) -> bool {
        U::regs().isr.read().txe().bit_is_set()
    }

    #[inline]
    fn listen_tx(&mut self, enable: bool) {
        U::regs().cr1.modify(|_, w| w.txeie().bit(enable));
    }
}
