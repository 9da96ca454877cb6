//! Frame buffer for accumulating partial reads.
//!
//! Backed by a [`RingBuffer`] so that extracting a frame is a cursor move.
//! Serial reads arrive in arbitrary fragments; the buffer holds whatever is
//! incomplete and hands back every delimiter-terminated frame, still stuffed
//! and including its terminator, so the same buffer serves both local decode
//! and verbatim relay.
//!
//! # Example
//!
//! ```
//! use satlink::protocol::FrameBuffer;
//!
//! let mut buffer = FrameBuffer::new();
//! let mut frames = Vec::new();
//!
//! buffer.push(&[0x02, 0x41], &mut frames).unwrap();
//! assert!(frames.is_empty());
//!
//! buffer.push(&[0x00, 0x01], &mut frames).unwrap();
//! assert_eq!(&frames[0][..], &[0x02, 0x41, 0x00]);
//! assert_eq!(buffer.len(), 1);
//! ```

use bytes::Bytes;

use super::cobs::DELIMITER;
use super::ring_buffer::{RingBuffer, DEFAULT_RING_CAPACITY};
use crate::error::{Result, SatlinkError};

/// Accumulates link bytes and splits them into delimiter-terminated frames.
#[derive(Debug)]
pub struct FrameBuffer {
    ring: RingBuffer,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default capacity (1 KB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RING_CAPACITY)
    }

    /// Create a frame buffer that holds at most `capacity` unterminated bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::with_capacity(capacity),
        }
    }

    /// Push data into the buffer and collect all complete frames into `out`.
    ///
    /// Input larger than the free space is taken piecewise, extracting
    /// frames in between. Frames found before a failure stay in `out`.
    ///
    /// # Errors
    ///
    /// Returns [`SatlinkError::BufferOverflow`] when the buffer is full and
    /// holds no delimiter: the stream has lost synchronization and the
    /// caller should [`clear`](Self::clear) it. `requested` is the number of
    /// input bytes that were not taken.
    pub fn push(&mut self, data: &[u8], out: &mut Vec<Bytes>) -> Result<()> {
        self.push_until_full(data, out)
            .map_err(|rest| SatlinkError::BufferOverflow {
                requested: rest.len(),
                available: 0,
            })
    }

    /// Like [`push`](Self::push), but recovers from overflow in place.
    ///
    /// On overflow the buffer is cleared and the untaken input is skipped up
    /// to and including its next delimiter, since those bytes belong to the
    /// frame that overflowed. Returns how many overflows occurred.
    pub fn push_resync(&mut self, mut data: &[u8], out: &mut Vec<Bytes>) -> usize {
        let mut overflows = 0;
        while let Err(rest) = self.push_until_full(data, out) {
            overflows += 1;
            self.ring.clear();
            data = match rest.iter().position(|&b| b == DELIMITER) {
                Some(end) => &rest[end + 1..],
                None => &[],
            };
        }
        overflows
    }

    /// Append and extract until `data` is used up, or return the untaken rest.
    fn push_until_full<'a>(
        &mut self,
        mut data: &'a [u8],
        out: &mut Vec<Bytes>,
    ) -> std::result::Result<(), &'a [u8]> {
        while !data.is_empty() {
            let take = data.len().min(self.ring.free());
            if take == 0 {
                return Err(data);
            }

            let (head, rest) = data.split_at(take);
            if self.ring.append(head).is_err() {
                return Err(data);
            }
            data = rest;

            while let Some(frame) = self.try_extract_one() {
                out.push(frame);
            }
        }

        Ok(())
    }

    /// Try to extract a single frame, terminator included.
    fn try_extract_one(&mut self) -> Option<Bytes> {
        let end = self.ring.find_byte(DELIMITER)? + 1;
        let frame = self.ring.slice(0..end)?;
        self.ring.consume(end);
        Some(Bytes::from(frame))
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Get the configured capacity.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Discard any partially accumulated frame.
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
