//! # Codec Error Kinds
//!
//! This module provides `CdbError`, the typed enumeration of every failure
//! the codec can surface. Public entry points return `eyre::Result`; the
//! typed kind is constructed at the failure site so callers (and tests) can
//! recover it with `report.downcast_ref::<CdbError>()` regardless of any
//! context wrapped around it.
//!
//! All errors are fatal to the current decode or encode run. The codec
//! performs no I/O and never retries; partial results are never returned.

use crate::values::DataType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CdbError {
    /// A framing sentinel did not match at the given stream offset.
    #[error("bad magic at offset {offset}: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        offset: usize,
        expected: u32,
        found: u32,
    },

    /// A read ran past the end of the input.
    #[error("short read at offset {offset}: wanted {wanted} bytes, {available} available")]
    ShortRead {
        offset: usize,
        wanted: usize,
        available: usize,
    },

    /// A chunk's declared size overruns its parent or the input bounds.
    #[error("truncated chunk at offset {offset}: declared size {declared} overruns bound {bound}")]
    TruncatedChunk {
        offset: usize,
        declared: u32,
        bound: usize,
    },

    /// A chunk kind tag outside the enumerated set.
    #[error("unknown chunk kind {0:#06x}")]
    UnknownChunkKind(u32),

    /// A column data-type enumerant outside {0, 1, 2, 3, 4, 5, 10, 11}.
    #[error("unknown column data type {0}")]
    UnknownDataType(u32),

    /// A required child chunk was absent during table or column assembly.
    #[error("{parent} chunk is missing required {child} child")]
    MissingChild {
        parent: &'static str,
        child: &'static str,
    },

    /// The encoder has no TABLE_FLAGS value for this table identifier.
    #[error("no table flags known for table id {0}")]
    UnknownTableId(u32),

    /// A list cell failed the parenthesis-comma grammar during encode.
    #[error("malformed list text {0:?}")]
    MalformedList(String),

    /// A DB_STRUCTURE row carries a NULL table identifier.
    #[error("DB_STRUCTURE row for table {table:?} has a null id")]
    NullTableId { table: String },

    /// zlib reported an error, or the inflated size disagrees with the header.
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// A cell value does not fit the column's annotated integer sub-width.
    #[error("value {value} out of range for {data_type:?} column")]
    OutOfRange { value: i64, data_type: DataType },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_downcast_through_eyre_context() {
        use eyre::WrapErr;

        let report: eyre::Report = Err::<(), _>(CdbError::UnknownTableId(999))
            .wrap_err("encoding table X")
            .unwrap_err();

        match report.downcast_ref::<CdbError>() {
            Some(CdbError::UnknownTableId(999)) => {}
            other => panic!("unexpected downcast: {:?}", other),
        }
    }

    #[test]
    fn display_includes_offsets() {
        let err = CdbError::BadMagic {
            offset: 16,
            expected: 0xAAAA_AAAA,
            found: 0,
        };
        let text = err.to_string();
        assert!(text.contains("offset 16"));
        assert!(text.contains("0xaaaaaaaa"));
    }
}
