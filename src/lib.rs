//! # cydb - Cyanide Database Codec
//!
//! cydb is a bidirectional codec between the chunk-based binary database
//! files emitted by Cyanide games (CDB) and a relational mirror hosted in
//! SQLite. Decoding turns a CDB file into an ordinary SQL database any
//! tool can query and edit; encoding turns such a database back into a
//! CDB file the game's own converter accepts, with the decompressed chunk
//! stream byte-identical for unmodified inputs.
//!
//! ## Quick Start
//!
//! ```ignore
//! let bytes = std::fs::read("ChampDBEx.cdb")?;
//!
//! // CDB -> SQLite
//! let conn = cydb::decode(&bytes)?;
//! let teams: i64 =
//!     conn.query_row("SELECT count(*) FROM DYN_team", [], |r| r.get(0))?;
//!
//! // ... edit through SQL ...
//!
//! // SQLite -> CDB
//! let out = cydb::encode(&conn)?;
//! std::fs::write("ChampDBEx.cdb", out)?;
//! ```
//!
//! ## File Format
//!
//! A CDB file is usually zlib-framed (`0xFFFFFFFF` magic, uncompressed
//! size, compressed size, deflate payload). The inflated stream is a
//! single wrapper chunk described as `cyanide database`:
//!
//! ```text
//! WRAPPER "cyanide database"
//! ├── DATABASE_FLAGS (274)
//! └── DATABASE_TABLES [array]
//!     ├── TABLE "<name>"
//!     │   ├── TABLE_ID
//!     │   ├── ROW_COUNT
//!     │   ├── TABLE_FLAGS
//!     │   └── COLUMN_DEFINITIONS [array]
//!     │       └── COLUMN "<name>"
//!     │           ├── COLUMN_INDEX
//!     │           ├── COLUMN_DATA_TYPE
//!     │           ├── COLUMN_VALUES
//!     │           └── COLUMN_BLOB_DATA (strings and lists only)
//!     └── ...
//! ```
//!
//! Storage is columnar: each column carries a fixed-stride values chunk
//! (integers, float words, string lengths, list element counts, packed
//! boolean bits) and, for strings and numeric lists, a variable-width
//! blob chunk. Everything is little-endian and 4-byte aligned.
//!
//! ## Relational Mirror
//!
//! The mirror holds one SQL table per CDB table, columns in their
//! original physical order, plus a synthetic `DB_STRUCTURE` table mapping
//! table names to their numeric identifiers. Each column's declared type
//! is `'<BASE> <N>'` where `N` packs `(table_id, column_index,
//! data_type)`; that annotation is the whole round-trip key, so no
//! content sniffing happens on encode.
//!
//! ## Module Overview
//!
//! - [`cursor`]: little-endian positional reader/writer with alignment
//! - [`chunk`]: chunk framing - reader, writer, size back-patching
//! - [`compress`]: zlib framing detection, inflate, deflate
//! - [`values`]: column data types, cell values, list text grammar
//! - [`columns`]: the eight per-type column codecs
//! - [`meta`]: packed column metadata and type annotations
//! - [`flags`]: the fixed table-identifier-to-flags map
//! - [`decode`]: chunk tree to SQLite
//! - [`encode`]: SQLite to chunk tree
//!
//! ## Scope
//!
//! The codec knows nothing about what any column means, never reorders
//! rows or columns, and promises byte identity only for the decompressed
//! stream (zlib output differs between implementations). It is
//! single-threaded and synchronous; parallelize across files, not within
//! one.

pub mod chunk;
pub mod columns;
pub mod compress;
pub mod cursor;
pub mod decode;
pub mod encode;
pub mod error;
pub mod flags;
pub mod meta;
pub mod values;

pub use decode::{decode, decode_into};
pub use encode::encode;
pub use error::CdbError;
pub use values::{DataType, Value};
