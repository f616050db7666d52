// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Buffered serial transport.
//!
//! [`SerialPort`] is the byte-level UART seam the board implements. [`SerialChannel`] wraps a port
//! with receive and transmit rings filled and drained from the UART interrupt, and task code sees
//! it only as a [`ByteChannel`].

pub mod channel;
pub mod ring;

use core::convert::Infallible;

use crate::error::{PortError, TransportError};

pub use channel::SerialChannel;
pub use ring::RingBuffer;

/// One UART, non-blocking in both directions.
pub trait SerialPort {
    /// Next received byte, `WouldBlock` when the receive register is empty.
    fn read(&mut self) -> nb::Result<u8, PortError>;

    /// Load one byte into the transmitter, `WouldBlock` while it is busy.
    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible>;

    /// `true` when the transmitter can take a byte right now.
    fn is_tx_idle(&self) -> bool;

    /// Enable or disable the transmit-empty interrupt.
    fn listen_tx(&mut self, _enable: bool) {}
}

/// Task-side view of a buffered serial channel.
pub trait ByteChannel {
    /// Queue one byte for transmission. `WouldBlock` when the transmit ring is full; the caller
    /// owns the retry policy.
    fn try_send(&mut self, byte: u8) -> nb::Result<(), TransportError>;

    /// Oldest received byte, if any.
    fn try_recv(&mut self) -> Option<u8>;

    /// Received bytes waiting to be read.
    fn pending(&self) -> usize;

    /// Free space in the transmit ring.
    fn tx_free(&self) -> usize;

    /// Read and clear the sticky flag raised when a received byte found the ring full.
    fn take_rx_overflow(&mut self) -> bool;

    /// Received bytes lost to a full ring so far.
    fn rx_dropped(&self) -> u32;

    /// Hardware receive faults seen so far (overrun, framing, noise, parity).
    fn rx_errors(&self) -> u32;
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    fn try_send(&mut self, byte: u8) -> nb::Result<(), TransportError> {
        (**self).try_send(byte)
    }

    fn try_recv(&mut self) -> Option<u8> {
        (**self).try_recv()
    }

    fn pending(&self) -> usize {
        (**self).pending()
    }

    fn tx_free(&self) -> usize {
        (**self).tx_free()
    }

    fn take_rx_overflow(&mut self) -> bool {
        (**self).take_rx_overflow()
    }

    fn rx_dropped(&self) -> u32 {
        (**self).rx_dropped()
    }

    fn rx_errors(&self) -> u32 {
        (**self).rx_errors()
    }
}

/// Queue `byte`, retrying at most `retries` times while the transmit ring is full.
///
/// Never call this from interrupt context: the ring only drains from the UART interrupt.
pub fn send_bounded<C: ByteChannel + ?Sized>(
    ch: &mut C,
    byte: u8,
    retries: u32,
) -> Result<(), TransportError> {
    let mut attempts = 0;
    loop {
        match ch.try_send(byte) {
            Ok(()) => return Ok(()),
            Err(nb::Error::Other(e)) => return Err(e),
            Err(nb::Error::WouldBlock) if attempts < retries => attempts += 1,
            Err(nb::Error::WouldBlock) => return Err(TransportError::Timeout),
        }
    }
}

/// Queue every byte of `bytes` with the same per-byte retry budget.
pub fn send_all_bounded<C: ByteChannel + ?Sized>(
    ch: &mut C,
    bytes: &[u8],
    retries: u32,
) -> Result<(), TransportError> {
    bytes.iter().try_for_each(|&b| send_bounded(ch, b, retries))
}

/// Move received bytes from `from` to the transmit side of `to` until `from` is empty or `to`
/// is full. Returns the number of bytes moved.
pub fn relay<A, B>(from: &mut A, to: &mut B) -> usize
where
    A: ByteChannel + ?Sized,
    B: ByteChannel + ?Sized,
{
    let mut moved = 0;
    while from.pending() > 0 && to.tx_free() > 0 {
        let Some(byte) = from.try_recv() else { break };
        if to.try_send(byte).is_err() {
            // tx_free said there was room.
            break;
        }
        moved += 1;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChannel;

    #[test]
    fn relay_stops_when_destination_fills() {
        let mut host = MockChannel::with_input(b"abcdef");
        let mut platform = MockChannel::default();
        platform.tx_capacity = 4;
        assert_eq!(relay(&mut host, &mut platform), 4);
        assert_eq!(platform.sent, b"abcd");
        assert_eq!(host.pending(), 2);

        platform.sent.clear();
        assert_eq!(relay(&mut host, &mut platform), 2);
        assert_eq!(platform.sent, b"ef");
    }

    #[test]
    fn send_all_reports_first_failure() {
        let mut ch = MockChannel::default();
        ch.tx_capacity = 2;
        assert_eq!(
            send_all_bounded(&mut ch, b"xyz", 3),
            Err(TransportError::Timeout)
        );
        assert_eq!(ch.sent, b"xy");
    }
}
