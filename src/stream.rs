use std::collections::VecDeque;

/// An in-memory byte pipe with a fixed capacity.
///
/// A writer pushes bytes in at one end, a reader drains them from the other.
/// Writes beyond the remaining capacity are truncated rather than refused:
/// `write` reports how many bytes it took and the caller retries later with
/// the rest. Once the writer calls `end_input` no further bytes are accepted;
/// once `set_error` is called both directions shut down.
pub struct ByteStream {
    buf: VecDeque<u8>,
    capacity: usize,
    bytes_written: u64,
    bytes_read: u64,
    input_ended: bool,
    error: bool,
}

impl ByteStream {
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            buf: VecDeque::with_capacity(capacity),
            capacity,
            bytes_written: 0,
            bytes_read: 0,
            input_ended: false,
            error: false,
        }
    }

    /// Accept as much of `data` as currently fits; returns the number of
    /// bytes taken (from the front of `data`).
    pub fn write(&mut self, data: &[u8]) -> usize {
        if self.input_ended || self.error {
            return 0;
        }
        let n = std::cmp::min(data.len(), self.remaining_capacity());
        self.buf.extend(data[..n].iter());
        self.bytes_written += n as u64;
        n
    }

    /// Copy out up to `len` bytes from the front without removing them.
    pub fn peek(&self, len: usize) -> Vec<u8> {
        self.buf.iter().take(len).copied().collect()
    }

    /// Discard up to `len` bytes from the front.
    pub fn pop(&mut self, len: usize) {
        let n = std::cmp::min(len, self.buf.len());
        drop(self.buf.drain(..n));
        self.bytes_read += n as u64;
    }

    /// Peek-and-pop. Returns nothing once the stream is in the error state.
    pub fn read(&mut self, len: usize) -> Vec<u8> {
        if self.error {
            return Vec::new();
        }
        let out = self.peek(len);
        self.pop(out.len());
        out
    }

    /// One-way: no more bytes will ever be written.
    pub fn end_input(&mut self) {
        self.input_ended = true;
    }

    /// One-way: poison the stream in both directions.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn input_ended(&self) -> bool {
        self.input_ended
    }

    pub fn error(&self) -> bool {
        self.error
    }

    /// Input has ended and everything written has been read out.
    pub fn eof(&self) -> bool {
        self.input_ended && self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
