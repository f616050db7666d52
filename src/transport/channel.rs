// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-driven serial channel: one UART plus a receive and a transmit ring.
//!
//! The UART interrupt calls [`SerialChannel::on_interrupt`], which moves bytes from the receive
//! register into the RX ring and from the TX ring into the transmit register. Task context only
//! touches the rings through [`ByteChannel`].

use crate::config::SERIAL_BUFFER_SIZE;
use crate::error::TransportError;
use crate::transport::ring::RingBuffer;
use crate::transport::{ByteChannel, SerialPort};

pub struct SerialChannel<P, const N: usize = SERIAL_BUFFER_SIZE> {
    port: P,
    rx: RingBuffer<N>,
    tx: RingBuffer<N>,
    rx_errors: u32,
}

impl<P: SerialPort, const N: usize> SerialChannel<P, N> {
    pub const fn new(port: P) -> Self {
        Self {
            port,
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            rx_errors: 0,
        }
    }

    #[inline]
    pub fn port(&self) -> &P {
        &self.port
    }

    #[inline]
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// UART interrupt body.
    pub fn on_interrupt(&mut self) {
        self.service_rx();
        self.service_tx();
    }

    fn service_rx(&mut self) {
        loop {
            match self.port.read() {
                Ok(byte) => {
                    if !self.rx.try_push(byte) {
                        warn!("rx ring full, byte dropped");
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_e)) => {
                    self.rx_errors = self.rx_errors.wrapping_add(1);
                    warn!("uart receive fault: {}", _e);
                }
            }
        }
    }

    /// Move queued bytes into the transmitter until it stops accepting them. Also runs from task
    /// context when the transmitter is idle, since an idle UART raises no further TX interrupt.
    fn service_tx(&mut self) {
        while let Some(byte) = self.tx.peek() {
            match self.port.write(byte) {
                Ok(()) => {
                    self.tx.try_pop();
                }
                Err(_) => break,
            }
        }
        self.port.listen_tx(!self.tx.is_empty());
    }
}

impl<P: SerialPort, const N: usize> ByteChannel for SerialChannel<P, N> {
    fn try_send(&mut self, byte: u8) -> nb::Result<(), TransportError> {
        if self.tx.is_full() {
            return Err(nb::Error::WouldBlock);
        }
        self.tx.try_push(byte);
        if self.port.is_tx_idle() {
            self.service_tx();
        } else {
            self.port.listen_tx(true);
        }
        Ok(())
    }

    fn try_recv(&mut self) -> Option<u8> {
        self.rx.try_pop()
    }

    #[inline]
    fn pending(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    fn tx_free(&self) -> usize {
        self.tx.free()
    }

    fn take_rx_overflow(&mut self) -> bool {
        self.rx.take_overflow()
    }

    #[inline]
    fn rx_dropped(&self) -> u32 {
        self.rx.dropped()
    }

    #[inline]
    fn rx_errors(&self) -> u32 {
        self.rx_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortError;
    use crate::testing::MockPort;
    use crate::transport::send_bounded;

    #[test]
    fn idle_transmitter_is_kicked_synchronously() {
        let mut ch: SerialChannel<MockPort, 8> = SerialChannel::new(MockPort::default());
        ch.try_send(b'a').unwrap();
        assert_eq!(ch.port().sent, b"a");
        assert_eq!(ch.tx_free(), 8);
    }

    #[test]
    fn busy_transmitter_queues_until_interrupt() {
        let mut ch: SerialChannel<MockPort, 4> = SerialChannel::new(MockPort::default());
        ch.port_mut().tx_ready = false;
        for b in b"abcd" {
            ch.try_send(*b).unwrap();
        }
        assert_eq!(ch.try_send(b'e'), Err(nb::Error::WouldBlock));
        assert!(ch.port().tx_listening);
        assert!(ch.port().sent.is_empty());

        ch.port_mut().tx_ready = true;
        ch.on_interrupt();
        assert_eq!(ch.port().sent, b"abcd");
        assert!(!ch.port().tx_listening);
    }

    #[test]
    fn bounded_send_times_out() {
        let mut ch: SerialChannel<MockPort, 2> = SerialChannel::new(MockPort::default());
        ch.port_mut().tx_ready = false;
        assert_eq!(send_bounded(&mut ch, 1, 10), Ok(()));
        assert_eq!(send_bounded(&mut ch, 2, 10), Ok(()));
        assert_eq!(send_bounded(&mut ch, 3, 10), Err(TransportError::Timeout));
    }

    #[test]
    fn receive_preserves_order_and_counts_faults() {
        let mut ch: SerialChannel<MockPort, 4> = SerialChannel::new(MockPort::default());
        ch.port_mut().incoming.extend([Ok(1), Err(PortError::Framing), Ok(2)]);
        ch.on_interrupt();
        assert_eq!(ch.pending(), 2);
        assert_eq!(ch.rx_errors(), 1);
        assert_eq!(ch.try_recv(), Some(1));
        assert_eq!(ch.try_recv(), Some(2));
        assert_eq!(ch.try_recv(), None);
    }

    #[test]
    fn full_rx_ring_drops_and_flags() {
        let mut ch: SerialChannel<MockPort, 2> = SerialChannel::new(MockPort::default());
        ch.port_mut().incoming.extend([Ok(1), Ok(2), Ok(3)]);
        ch.on_interrupt();
        assert_eq!(ch.pending(), 2);
        assert_eq!(ch.rx_dropped(), 1);
        assert!(ch.take_rx_overflow());
        assert!(!ch.take_rx_overflow());
        assert_eq!(ch.try_recv(), Some(1));
        assert_eq!(ch.try_recv(), Some(2));
    }
}
