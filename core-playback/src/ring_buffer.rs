//! # Ring Buffer for PCM Bytes
//!
//! Bounded byte queue that decouples the irregular output size of codec decode
//! calls from the fixed frame requests of the playback loop.
//!
//! ## Design
//!
//! - **Ownership**: single owner, `&mut self` everywhere, no locking
//! - **Capacity**: fixed at creation
//! - **Overflow Policy**: a write that does not fit fails with
//!   [`PlaybackError::BufferOverflow`] and writes nothing
//! - **Underflow**: reads return whatever is buffered, never an error
//!
//! ## Usage
//!
//! ```rust
//! use core_playback::ring_buffer::RingBuffer;
//!
//! // 4096 stereo frames of s16le
//! let mut buffer = RingBuffer::new(2 * 2 * 4096);
//!
//! buffer.write(&[0x01, 0x00, 0xff, 0x7f]).unwrap();
//!
//! let mut output = vec![0u8; 1024];
//! let read = buffer.read(&mut output);
//! assert_eq!(read, 4);
//! ```

use crate::error::{PlaybackError, Result};

pub struct RingBuffer {
    buffer: Vec<u8>,
    write_pos: usize,
    read_pos: usize,
    len: usize,
}

impl RingBuffer {
    /// Create a new ring buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            write_pos: 0,
            read_pos: 0,
            len: 0,
        }
    }

    /// Append `bytes` to the buffer.
    ///
    /// Either all bytes are written or none are.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }

        let free = self.free_space();
        if bytes.len() > free {
            return Err(PlaybackError::BufferOverflow {
                requested: bytes.len(),
                free,
            });
        }

        let capacity = self.capacity();
        let first = bytes.len().min(capacity - self.write_pos);
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(&bytes[..first]);
        let rest = bytes.len() - first;
        if rest > 0 {
            self.buffer[..rest].copy_from_slice(&bytes[first..]);
        }

        self.write_pos = (self.write_pos + bytes.len()) % capacity;
        self.len += bytes.len();

        Ok(bytes.len())
    }

    /// Read up to `output.len()` bytes. Returns the number of bytes copied.
    pub fn read(&mut self, output: &mut [u8]) -> usize {
        let max = output.len();
        self.read_up_to(max, output)
    }

    /// Read up to `max_bytes` bytes into the front of `output`.
    ///
    /// Fewer bytes are returned only when fewer are buffered (or `output` is
    /// shorter than `max_bytes`).
    pub fn read_up_to(&mut self, max_bytes: usize, output: &mut [u8]) -> usize {
        let to_read = self.len.min(max_bytes).min(output.len());
        if to_read == 0 {
            return 0;
        }

        let capacity = self.capacity();
        let first = to_read.min(capacity - self.read_pos);
        output[..first].copy_from_slice(&self.buffer[self.read_pos..self.read_pos + first]);
        let rest = to_read - first;
        if rest > 0 {
            output[first..to_read].copy_from_slice(&self.buffer[..rest]);
        }

        self.read_pos = (self.read_pos + to_read) % capacity;
        self.len -= to_read;

        to_read
    }

    /// Returns the number of bytes currently buffered.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Returns the number of bytes that can be written without overflowing.
    pub fn free_space(&self) -> usize {
        self.capacity() - self.len
    }

    /// Returns the total capacity of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.read_pos = 0;
        self.len = 0;
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if no more bytes can be written.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("size", &self.len)
            .finish()
    }
}
