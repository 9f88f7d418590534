//! # Chunk Reader
//!
//! Pull-style reader over a decompressed chunk stream. [`ChunkReader::begin`]
//! parses a header through its separator magic and hands back a
//! [`ChunkHeader`]; the caller interprets the body according to the kind,
//! then [`ChunkReader::finish`] consumes the body padding and end magic and
//! verifies that the declared size was honored exactly.
//!
//! The reader imposes no child order; assembly code matches each child's
//! kind as it appears.

use crate::chunk::{
    ChunkKind, ARRAY_BEGIN, ARRAY_END, CHUNK_BEGIN, CHUNK_END, CHUNK_SEPARATOR, MIN_CHUNK_SIZE,
};
use crate::cursor::Reader;
use crate::error::CdbError;
use eyre::{ensure, Result};

/// Parsed chunk header, valid between `begin` and the matching `finish`.
#[derive(Debug, Clone)]
pub struct ChunkHeader {
    pub kind: ChunkKind,
    pub description: Option<String>,
    /// Stream offset of the begin magic.
    pub start: usize,
    /// Stream offset one past the end magic (`start + size`).
    pub end: usize,
}

impl ChunkHeader {
    /// Stream offset of the end magic: where the body (plus padding) stops.
    #[inline]
    pub fn body_end(&self) -> usize {
        self.end - 4
    }
}

pub struct ChunkReader<'a> {
    cur: Reader<'a>,
    len: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            cur: Reader::new(stream),
            len: stream.len(),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cur.position()
    }

    /// Parses a chunk header up to and including the separator magic.
    ///
    /// `bound` is the enclosing body end (the stream end for the root);
    /// a declared size overrunning it fails with `TruncatedChunk`.
    pub fn begin(&mut self, bound: usize) -> Result<ChunkHeader> {
        let start = self.cur.position();
        self.expect_magic(CHUNK_BEGIN)?;

        let size = self.cur.read_u32()?;
        let end = start + size as usize;
        if size < MIN_CHUNK_SIZE || end > bound || end > self.len {
            return Err(CdbError::TruncatedChunk {
                offset: start,
                declared: size,
                bound: bound.min(self.len),
            }
            .into());
        }

        let kind = ChunkKind::try_from(self.cur.read_u32()?)?;
        let _reserved = self.cur.read_u32()?;

        let has_description = self.cur.read_u32()?;
        let description = if has_description != 0 {
            Some(self.read_description()?)
        } else {
            None
        };

        self.cur.skip_padding()?;
        self.expect_magic(CHUNK_SEPARATOR)?;

        Ok(ChunkHeader {
            kind,
            description,
            start,
            end,
        })
    }

    /// Consumes body padding and the end magic, verifying the size field.
    pub fn finish(&mut self, header: &ChunkHeader) -> Result<()> {
        self.cur.skip_padding()?;
        if self.cur.position() != header.body_end() {
            return Err(CdbError::TruncatedChunk {
                offset: header.start,
                declared: (header.end - header.start) as u32,
                bound: self.cur.position(),
            }
            .into());
        }
        self.expect_magic(CHUNK_END)
    }

    /// Reads a 32-bit body word.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.cur.read_u32()
    }

    /// Reads the raw remainder of a chunk's body, padding included.
    pub fn read_body(&mut self, header: &ChunkHeader) -> Result<&'a [u8]> {
        let len = header.body_end().saturating_sub(self.cur.position());
        self.cur.read_bytes(len)
    }

    /// Reads `len` body bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.cur.read_bytes(len)
    }

    /// Reads an array body's begin sentinel and element count.
    pub fn begin_array(&mut self) -> Result<u32> {
        self.expect_magic(ARRAY_BEGIN)?;
        self.cur.read_u32()
    }

    /// Reads an array body's end sentinel.
    pub fn finish_array(&mut self) -> Result<()> {
        self.expect_magic(ARRAY_END)
    }

    fn read_description(&mut self) -> Result<String> {
        let len = self.cur.read_u32()? as usize;
        let offset = self.cur.position();
        let bytes = self.cur.read_bytes(len)?;
        ensure!(
            len >= 1 && bytes[len - 1] == 0,
            "description at offset {} is not NUL-terminated",
            offset
        );
        let text = std::str::from_utf8(&bytes[..len - 1])
            .map_err(|e| eyre::eyre!("description at offset {} is not UTF-8: {}", offset, e))?;
        Ok(text.to_string())
    }

    fn expect_magic(&mut self, expected: u32) -> Result<()> {
        let offset = self.cur.position();
        let found = self.cur.read_u32()?;
        if found != expected {
            return Err(CdbError::BadMagic {
                offset,
                expected,
                found,
            }
            .into());
        }
        Ok(())
    }
}
