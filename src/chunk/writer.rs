//! # Chunk Writer
//!
//! Streaming writer with deferred size back-patching. A chunk's size field
//! counts every byte from its begin magic through its end magic, children
//! included, so no size is known at open time. `open` emits a placeholder
//! and pushes the start offset; `close` emits the trailer and records the
//! `(size_slot, final_size)` pair; `finalize` patches every recorded pair
//! into place and yields the finished stream. Patches land at known
//! offsets; nothing is rescanned.

use crate::chunk::{ChunkKind, ARRAY_BEGIN, ARRAY_END, CHUNK_BEGIN, CHUNK_END, CHUNK_SEPARATOR};
use crate::cursor::Writer;
use eyre::{ensure, Result};
use smallvec::SmallVec;

pub struct ChunkWriter {
    w: Writer,
    /// Start offsets of chunks opened and not yet closed.
    open: SmallVec<[usize; 8]>,
    /// `(size_slot_offset, final_size)` for every closed chunk.
    patches: Vec<(usize, u32)>,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self {
            w: Writer::new(),
            open: SmallVec::new(),
            patches: Vec::new(),
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.w.position()
    }

    /// Emits a chunk header with a placeholder size.
    pub fn open(&mut self, kind: ChunkKind, description: Option<&str>) {
        let start = self.w.position();
        self.open.push(start);

        self.w.put_u32(CHUNK_BEGIN);
        self.w.put_u32(0); // size, patched in finalize
        self.w.put_u32(kind as u32);
        self.w.put_u32(0); // reserved flags
        match description {
            Some(text) => {
                self.w.put_u32(1);
                self.w.put_u32(text.len() as u32 + 1);
                self.w.put_bytes(text.as_bytes());
                self.w.put_bytes(&[0]);
            }
            None => self.w.put_u32(0),
        }
        self.w.pad_to_alignment();
        self.w.put_u32(CHUNK_SEPARATOR);
    }

    /// Emits body padding and the end magic, recording the final size.
    pub fn close(&mut self) -> Result<()> {
        let Some(start) = self.open.pop() else {
            eyre::bail!("close without a matching open");
        };

        self.w.pad_to_alignment();
        self.w.put_u32(CHUNK_END);
        let size = (self.w.position() - start) as u32;
        self.patches.push((start + 4, size));
        Ok(())
    }

    /// Writes a 32-bit body word.
    pub fn put_u32(&mut self, value: u32) {
        self.w.put_u32(value);
    }

    /// Writes a body byte run.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.w.put_bytes(bytes);
    }

    /// Writes an array body's begin sentinel and element count.
    pub fn begin_array(&mut self, count: u32) {
        self.w.put_u32(ARRAY_BEGIN);
        self.w.put_u32(count);
    }

    /// Writes an array body's end sentinel.
    pub fn end_array(&mut self) {
        self.w.put_u32(ARRAY_END);
    }

    /// Back-patches every recorded size and returns the finished stream.
    pub fn finalize(mut self) -> Result<Vec<u8>> {
        ensure!(
            self.open.is_empty(),
            "finalize with {} chunk(s) still open",
            self.open.len()
        );
        for (slot, size) in self.patches.drain(..) {
            self.w.patch_u32(slot, size);
        }
        Ok(self.w.into_bytes())
    }
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_patched_depth_first() {
        let mut w = ChunkWriter::new();
        w.open(ChunkKind::Wrapper, Some("cyanide database"));
        w.open(ChunkKind::DatabaseFlags, None);
        w.put_u32(274);
        w.close().unwrap();
        w.close().unwrap();
        let bytes = w.finalize().unwrap();

        // Outer size spans the whole stream.
        let outer = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(outer as usize, bytes.len());

        // Header: 20 fixed + 4 len + 17 text ("cyanide database\0") + 3 pad
        // + 4 sep = 48; the nested chunk starts there.
        let inner_start = 48;
        assert_eq!(
            &bytes[inner_start..inner_start + 4],
            &CHUNK_BEGIN.to_le_bytes()
        );
        let inner = u32::from_le_bytes(bytes[inner_start + 4..inner_start + 8].try_into().unwrap());
        assert_eq!(inner, 32);
    }

    #[test]
    fn close_without_open_fails() {
        let mut w = ChunkWriter::new();
        assert!(w.close().is_err());
    }

    #[test]
    fn finalize_with_open_chunk_fails() {
        let mut w = ChunkWriter::new();
        w.open(ChunkKind::Wrapper, None);
        assert!(w.finalize().is_err());
    }

    #[test]
    fn placeholder_size_is_zero_until_finalize() {
        let mut w = ChunkWriter::new();
        w.open(ChunkKind::RowCount, None);
        w.put_u32(1);
        w.close().unwrap();
        // Before finalize the slot still holds the placeholder.
        assert_eq!(w.position(), 32);
        let bytes = w.finalize().unwrap();
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 32);
    }
}
