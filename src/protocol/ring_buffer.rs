//! Fixed-capacity circular byte store for receive accumulation.
//!
//! Bytes are appended at `tail` and consumed from `head`. Consumption only
//! ever drops a prefix, which is a cursor move, so draining a frame costs the
//! same no matter how much data is still queued behind it.
//!
//! ```
//! use satlink::protocol::RingBuffer;
//!
//! let mut ring = RingBuffer::with_capacity(8);
//! ring.append(b"abc\0de").unwrap();
//! let end = ring.find(b"\0").unwrap();
//! assert_eq!(ring.slice(0..end).unwrap(), b"abc");
//! ring.consume(end + 1);
//! assert_eq!(ring.to_vec(), b"de");
//! ```

use std::ops::Range;

use crate::error::{Result, SatlinkError};

/// Default receive buffer capacity in bytes.
pub const DEFAULT_RING_CAPACITY: usize = 1024;

/// Circular byte buffer with constant-time front removal.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buf: Box<[u8]>,
    /// Physical index of the first stored byte.
    head: usize,
    /// Physical index where the next byte is written.
    tail: usize,
    size: usize,
}

impl RingBuffer {
    /// Create an empty buffer holding at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            size: 0,
        }
    }

    /// Append `data` at the end.
    ///
    /// Writes nothing and returns [`SatlinkError::BufferOverflow`] when the
    /// data does not fit in the free space.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let available = self.free();
        if data.len() > available {
            return Err(SatlinkError::BufferOverflow {
                requested: data.len(),
                available,
            });
        }
        if data.is_empty() {
            return Ok(());
        }

        let capacity = self.capacity();
        let before_wrap = capacity - self.tail;
        if data.len() <= before_wrap {
            self.buf[self.tail..self.tail + data.len()].copy_from_slice(data);
        } else {
            let (first, second) = data.split_at(before_wrap);
            self.buf[self.tail..].copy_from_slice(first);
            self.buf[..second.len()].copy_from_slice(second);
        }

        self.tail = (self.tail + data.len()) % capacity;
        self.size += data.len();
        Ok(())
    }

    /// Logical offset of the first occurrence of `pattern`.
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        if pattern.is_empty() || pattern.len() > self.size {
            return None;
        }

        (0..=self.size - pattern.len())
            .find(|&start| pattern.iter().enumerate().all(|(i, &b)| self.at(start + i) == b))
    }

    /// Logical offset of the first occurrence of `byte`.
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        let (first, second) = self.as_slices();
        first
            .iter()
            .position(|&b| b == byte)
            .or_else(|| second.iter().position(|&b| b == byte).map(|i| first.len() + i))
    }

    /// Byte at logical `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        (index < self.size).then(|| self.at(index))
    }

    /// Copy of the contiguous logical range, unwrapped.
    ///
    /// Returns `None` if the range reaches past the stored bytes.
    pub fn slice(&self, range: Range<usize>) -> Option<Vec<u8>> {
        if range.start > range.end || range.end > self.size {
            return None;
        }

        let (first, second) = self.as_slices();
        let mut out = Vec::with_capacity(range.len());
        if range.start < first.len() {
            out.extend_from_slice(&first[range.start..range.end.min(first.len())]);
        }
        if range.end > first.len() {
            let start = range.start.saturating_sub(first.len());
            out.extend_from_slice(&second[start..range.end - first.len()]);
        }
        Some(out)
    }

    /// Copy of everything stored.
    pub fn to_vec(&self) -> Vec<u8> {
        let (first, second) = self.as_slices();
        [first, second].concat()
    }

    /// Drop the first `n` bytes (clamped to the stored length).
    #[inline]
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.size);
        self.head = (self.head + n) % self.capacity();
        self.size -= n;
    }

    /// Discard all stored bytes.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.size = 0;
    }

    /// Number of stored bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Maximum number of bytes the buffer can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Remaining free space.
    #[inline]
    pub fn free(&self) -> usize {
        self.capacity() - self.size
    }

    /// Stored bytes as up to two physical slices, in logical order.
    fn as_slices(&self) -> (&[u8], &[u8]) {
        let end = self.head + self.size;
        if end <= self.capacity() {
            (&self.buf[self.head..end], &[])
        } else {
            (&self.buf[self.head..], &self.buf[..end - self.capacity()])
        }
    }

    #[inline]
    fn at(&self, index: usize) -> u8 {
        self.buf[(self.head + index) % self.capacity()]
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RING_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_append_and_read() {
        let mut ring = RingBuffer::with_capacity(16);
        ring.append(b"hello").unwrap();

        assert_eq!(ring.len(), 5);
        assert_eq!(ring.free(), 11);
        assert_eq!(ring.to_vec(), b"hello");
        assert_eq!(ring.get(1), Some(b'e'));
        assert_eq!(ring.get(5), None);
    }

    #[test]
    fn test_overflow_writes_nothing() {
        let mut ring = RingBuffer::with_capacity(8);
        ring.append(b"12345").unwrap();

        let err = ring.append(b"6789").unwrap_err();
        assert!(matches!(
            err,
            SatlinkError::BufferOverflow {
                requested: 4,
                available: 3
            }
        ));
        assert_eq!(ring.to_vec(), b"12345");

        // Exactly filling is fine
        ring.append(b"678").unwrap();
        assert_eq!(ring.free(), 0);
    }

    #[test]
    fn test_capacity_ten_scenario() {
        let mut ring = RingBuffer::with_capacity(10);
        ring.append(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        ring.consume(5);
        ring.append(&[9, 10, 11, 12, 13, 14, 15]).unwrap();

        assert_eq!(ring.len(), 10);
        assert_eq!(ring.to_vec(), vec![6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_find_across_wrap() {
        let mut ring = RingBuffer::with_capacity(8);
        ring.append(b"xxxxxx").unwrap();
        ring.consume(6);
        ring.append(b"ab\0cd").unwrap();

        assert_eq!(ring.find(b"\0"), Some(2));
        assert_eq!(ring.find_byte(0), Some(2));
        assert_eq!(ring.find(b"b\0c"), Some(1));
        assert_eq!(ring.find(b"zz"), None);
        assert_eq!(ring.find(b""), None);
    }

    #[test]
    fn test_find_byte_in_second_half() {
        let mut ring = RingBuffer::with_capacity(6);
        ring.append(b"abcd").unwrap();
        ring.consume(3);
        ring.append(b"ef\0").unwrap();

        assert_eq!(ring.to_vec(), b"def\0");
        assert_eq!(ring.find_byte(0), Some(3));
    }

    #[test]
    fn test_slice_wrapped() {
        let mut ring = RingBuffer::with_capacity(5);
        ring.append(b"abc").unwrap();
        ring.consume(2);
        ring.append(b"defg").unwrap();

        assert_eq!(ring.to_vec(), b"cdefg");
        assert_eq!(ring.slice(1..4).unwrap(), b"def");
        assert_eq!(ring.slice(0..5).unwrap(), b"cdefg");
        assert_eq!(ring.slice(3..5).unwrap(), b"fg");
        assert_eq!(ring.slice(2..2).unwrap(), b"");
        assert!(ring.slice(4..6).is_none());
    }

    #[test]
    fn test_consume_clamps() {
        let mut ring = RingBuffer::with_capacity(4);
        ring.append(b"ab").unwrap();
        ring.consume(10);
        assert!(ring.is_empty());
        ring.append(b"abcd").unwrap();
        assert_eq!(ring.to_vec(), b"abcd");
    }

    #[test]
    fn test_clear() {
        let mut ring = RingBuffer::with_capacity(4);
        ring.append(b"abc").unwrap();
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.free(), 4);
    }

    #[test]
    fn test_fifo_through_wraparounds() {
        let mut ring = RingBuffer::with_capacity(7);
        let mut written = Vec::new();
        let mut read = Vec::new();

        // 30 bytes through a 7-byte ring wraps more than three times
        for i in 0..10u8 {
            let chunk = [i * 3, i * 3 + 1, i * 3 + 2];
            ring.append(&chunk).unwrap();
            written.extend_from_slice(&chunk);

            read.extend(ring.slice(0..3).unwrap());
            ring.consume(3);
        }

        assert_eq!(read, written);
        assert!(ring.is_empty());
    }

    proptest! {
        #[test]
        fn prop_fifo_law(chunks in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..6), 1..40)
        ) {
            let mut ring = RingBuffer::with_capacity(6);
            let mut expected = Vec::new();
            let mut actual = Vec::new();

            for chunk in chunks {
                ring.append(&chunk).unwrap();
                expected.extend_from_slice(&chunk);
                actual.extend(ring.slice(0..chunk.len()).unwrap());
                ring.consume(chunk.len());
            }

            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn prop_overflow_is_atomic(fill in 0usize..10, extra in 1usize..10) {
            let mut ring = RingBuffer::with_capacity(10);
            ring.append(&vec![7u8; fill]).unwrap();
            let before = ring.to_vec();

            let attempt = vec![9u8; 10 - fill + extra];
            prop_assert!(ring.append(&attempt).is_err());
            prop_assert_eq!(ring.to_vec(), before);
        }
    }
}
