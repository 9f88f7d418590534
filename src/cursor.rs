//! # Binary Cursor
//!
//! Positional little-endian reader and writer over contiguous byte ranges.
//! Every multi-byte integer in the CDB format is little-endian, and every
//! header and body ends padded to a 4-byte boundary of the absolute stream
//! offset, so both halves expose the same alignment primitive:
//! `(4 - (pos & 3)) & 3` bytes of padding.
//!
//! The reader fails with [`CdbError::ShortRead`] on any read past the end
//! of its input. The writer owns its buffer and grows it by an amortized
//! factor of 1.5, never less than the required tail, and supports
//! random-access `patch_u32` writes so chunk sizes can be back-patched
//! after their contents are known.

use crate::error::CdbError;
use eyre::Result;

/// Read cursor over a borrowed byte range.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Reads a little-endian unsigned 32-bit word.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap())) // length checked by read_bytes
    }

    /// Reads `len` bytes and advances the cursor.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(CdbError::ShortRead {
                offset: self.pos,
                wanted: len,
                available: self.remaining(),
            }
            .into());
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Skips padding up to the next 4-byte boundary of the stream offset.
    pub fn skip_padding(&mut self) -> Result<()> {
        let pad = padding_for(self.pos);
        self.read_bytes(pad)?;
        Ok(())
    }
}

/// Write cursor over an owned, growable byte buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Appends a little-endian unsigned 32-bit word.
    pub fn put_u32(&mut self, value: u32) {
        self.put_bytes(&value.to_le_bytes());
    }

    /// Appends a byte run.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.grow_for(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Emits zero padding up to the next 4-byte boundary of the stream offset.
    pub fn pad_to_alignment(&mut self) {
        const ZERO: [u8; 3] = [0; 3];
        let pad = padding_for(self.buf.len());
        self.put_bytes(&ZERO[..pad]);
    }

    /// Overwrites a previously written 32-bit slot in place.
    ///
    /// The slot must lie entirely within the written region.
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Amortized 1.5x growth, never below the required tail.
    fn grow_for(&mut self, additional: usize) {
        let required = self.buf.len() + additional;
        if required > self.buf.capacity() {
            let target = required.max(self.buf.capacity() + self.buf.capacity() / 2);
            self.buf.reserve_exact(target - self.buf.len());
        }
    }
}

/// Bytes of padding needed to bring `pos` to a 4-byte boundary.
#[inline]
pub fn padding_for(pos: usize) -> usize {
    (4 - (pos & 3)) & 3
}
