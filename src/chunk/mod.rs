//! # Chunk Framing Protocol
//!
//! Every object in a CDB stream is a chunk: a self-framed, type-tagged,
//! sized byte region with an optional NUL-terminated description and
//! possibly nested children. The layout is:
//!
//! ```text
//! +------------------+
//! | begin  0xAAAAAAAA|  4 bytes
//! | size             |  4 bytes, begin through end inclusive
//! | kind             |  4 bytes (8-bit semantic, stored as 32-bit)
//! | reserved flags   |  4 bytes, always zero
//! | has-description  |  4 bytes, 0 or 1
//! | [desc len]       |  4 bytes, byte length including trailing NUL
//! | [desc bytes+NUL] |  variable
//! | header pad       |  0..3 bytes to a 4-byte stream offset
//! | sep    0xBBBBBBBB|  4 bytes
//! | body             |  kind-specific
//! | body pad         |  0..3 bytes
//! | end    0xCCCCCCCC|  4 bytes
//! +------------------+
//! ```
//!
//! Arrays are a body pattern rather than a chunk kind: an `ARRAY_BEGIN`
//! sentinel, a 32-bit element count, that many same-kind child chunks,
//! and an `ARRAY_END` sentinel.
//!
//! Because a parent's size covers all descendants, the writer cannot know
//! any size at open time; it emits placeholders, tracks open chunks on a
//! stack, and back-patches every size in [`writer::ChunkWriter::finalize`].

pub mod reader;
pub mod writer;

pub use reader::{ChunkHeader, ChunkReader};
pub use writer::ChunkWriter;

use crate::error::CdbError;

pub const CHUNK_BEGIN: u32 = 0xAAAA_AAAA;
pub const CHUNK_SEPARATOR: u32 = 0xBBBB_BBBB;
pub const CHUNK_END: u32 = 0xCCCC_CCCC;
pub const ARRAY_BEGIN: u32 = 0xDDDD_DDDD;
pub const ARRAY_END: u32 = 0xEEEE_EEEE;

/// Smallest legal chunk: descriptionless header, empty body.
pub const MIN_CHUNK_SIZE: u32 = 28;

/// Chunk kind tags as stored in the header's kind word.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    Wrapper = 0x00,
    DatabaseTables = 0x01,
    DatabaseFlags = 0x02,
    Table = 0x10,
    RowCount = 0x11,
    ColumnDefinitions = 0x12,
    TableId = 0x15,
    TableFlags = 0x16,
    Column = 0x20,
    ColumnDataType = 0x21,
    ColumnValues = 0x22,
    ColumnBlobData = 0x23,
    ColumnIndex = 0x24,
}

impl TryFrom<u32> for ChunkKind {
    type Error = CdbError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ChunkKind::Wrapper),
            0x01 => Ok(ChunkKind::DatabaseTables),
            0x02 => Ok(ChunkKind::DatabaseFlags),
            0x10 => Ok(ChunkKind::Table),
            0x11 => Ok(ChunkKind::RowCount),
            0x12 => Ok(ChunkKind::ColumnDefinitions),
            0x15 => Ok(ChunkKind::TableId),
            0x16 => Ok(ChunkKind::TableFlags),
            0x20 => Ok(ChunkKind::Column),
            0x21 => Ok(ChunkKind::ColumnDataType),
            0x22 => Ok(ChunkKind::ColumnValues),
            0x23 => Ok(ChunkKind::ColumnBlobData),
            0x24 => Ok(ChunkKind::ColumnIndex),
            other => Err(CdbError::UnknownChunkKind(other)),
        }
    }
}
