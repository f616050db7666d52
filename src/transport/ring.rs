// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Fixed-capacity byte ring.
//!
//! One side pushes and the other pops; the owning [`SerialChannel`](super::SerialChannel) keeps
//! interrupt and task context apart. A push into a full ring never blocks and never grows the
//! buffer: the byte is dropped and a sticky overflow flag is raised for the consumer.

pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    read: usize,
    write: usize,
    count: usize,
    overflow: bool,
    dropped: u32,
}

impl<const N: usize> RingBuffer<N> {
    /// Declared const so a channel can sit in a `static`.
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            read: 0,
            write: 0,
            count: 0,
            overflow: false,
            dropped: 0,
        }
    }

    /// Append `byte`. Returns `false` and sets the overflow flag when the ring is full.
    pub fn try_push(&mut self, byte: u8) -> bool {
        if self.count >= N {
            self.overflow = true;
            self.dropped = self.dropped.wrapping_add(1);
            return false;
        }
        self.buf[self.write] = byte;
        self.write = (self.write + 1) % N;
        self.count += 1;
        true
    }

    pub fn try_pop(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.read = (self.read + 1) % N;
        self.count -= 1;
        Some(byte)
    }

    /// Oldest byte, left in place.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        if self.count == 0 {
            None
        } else {
            Some(self.buf[self.read])
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count >= N
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Free slots.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.count
    }

    /// Bytes dropped since construction.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Read and clear the overflow flag.
    pub fn take_overflow(&mut self) -> bool {
        core::mem::replace(&mut self.overflow, false)
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_until_full_then_overflow() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let mut pushed = 0;
        while !ring.is_full() {
            assert!(ring.try_push(pushed as u8));
            pushed += 1;
            assert_eq!(ring.len(), pushed);
        }
        assert_eq!(pushed, 8);
        assert!(!ring.try_push(0xAA));
        assert_eq!(ring.len(), 8);
        assert!(ring.take_overflow());
        assert!(!ring.take_overflow());
        assert_eq!(ring.dropped(), 1);
    }

    #[test]
    fn fifo_order_across_wrap() {
        let mut ring: RingBuffer<5> = RingBuffer::new();
        for round in 0..4u8 {
            for i in 0..5u8 {
                assert!(ring.try_push(round * 10 + i));
            }
            for i in 0..5u8 {
                assert_eq!(ring.try_pop(), Some(round * 10 + i));
            }
            assert!(ring.is_empty());
            assert_eq!(ring.try_pop(), None);
        }
    }

    #[test]
    fn overflow_keeps_existing_contents() {
        let mut ring: RingBuffer<2> = RingBuffer::new();
        ring.try_push(1);
        ring.try_push(2);
        ring.try_push(3);
        assert_eq!(ring.peek(), Some(1));
        assert_eq!(ring.try_pop(), Some(1));
        assert_eq!(ring.try_pop(), Some(2));
        assert_eq!(ring.try_pop(), None);
        assert_eq!(ring.free(), 2);
    }
}
