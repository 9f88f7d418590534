//! # Packed Column Metadata
//!
//! Each relational column carries the CDB metadata needed for re-encode in
//! its declared SQL type, as `"<BASE> <N>"` where
//! `N = (table_id * 256 + column_index) * 16 + (data_type & 0xF)`.
//!
//! The packing is exactly invertible over the full 32-bit range:
//! `data_type = N & 0xF`, `column_index = (N >> 4) & 0xFF`,
//! `table_id = N >> 12`. Unpacking yields the raw data-type nibble;
//! validating it against the enumerated set is the caller's job, so
//! `pack(unpack(n)) == n` holds for every `n`.
//!
//! The synthetic `DB_STRUCTURE` table annotates both of its columns with
//! the sentinel 274, which keeps the schema parser uniform (it happens to
//! equal the fixed DATABASE_FLAGS word).
//!
//! Annotation recovery scans for a trailing decimal suffix after trimming
//! whitespace; it never slices positionally, so padded or re-formatted
//! declarations still parse.

/// Sentinel annotation integer used by DB_STRUCTURE's own columns.
pub const STRUCTURE_SENTINEL: u32 = 274;

/// Unpacked column metadata. `data_type` is the raw nibble, not yet
/// validated against the data-type enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMeta {
    pub table_id: u32,
    pub column_index: u32,
    pub data_type: u32,
}

/// Packs table id, column index, and data type into one annotation integer.
pub fn pack(table_id: u32, column_index: u32, data_type: u32) -> u32 {
    (table_id * 256 + column_index) * 16 + (data_type & 0xF)
}

/// Inverts [`pack`].
pub fn unpack(n: u32) -> ColumnMeta {
    ColumnMeta {
        table_id: n >> 12,
        column_index: (n >> 4) & 0xFF,
        data_type: n & 0xF,
    }
}

/// Formats a column's declared SQL type, e.g. `INTEGER 12288`.
pub fn annotation(sql_base: &str, n: u32) -> String {
    format!("{} {}", sql_base, n)
}

/// Recovers the annotation integer from a declared column type.
///
/// Returns `None` when the declaration carries no trailing integer.
pub fn parse_annotation(declared: &str) -> Option<u32> {
    let trimmed = declared.trim_end();
    let digits_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    trimmed[digits_start..].parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_matches_reference_example() {
        // table_id 3, column_index 0, INTEGER
        assert_eq!(pack(3, 0, 0), 12288);
    }

    #[test]
    fn unpack_inverts_pack_for_legal_triples() {
        for table_id in [0u32, 1, 3, 17, 255, 274, 1000] {
            for column_index in [0u32, 1, 7, 255] {
                for data_type in [0u32, 1, 2, 3, 4, 5, 10, 11] {
                    let n = pack(table_id, column_index, data_type);
                    let meta = unpack(n);
                    assert_eq!(meta.table_id, table_id);
                    assert_eq!(meta.column_index, column_index);
                    assert_eq!(meta.data_type, data_type);
                }
            }
        }
    }

    #[test]
    fn pack_inverts_unpack_over_the_word() {
        for n in [0u32, 1, 15, 274, 12288, 0xFFFF, 0xABCD_EF01, u32::MAX] {
            let meta = unpack(n);
            assert_eq!(pack(meta.table_id, meta.column_index, meta.data_type), n);
        }
    }

    #[test]
    fn sentinel_unpacks_to_string_type() {
        // The sentinel shares its low nibble with the STRING enumerant.
        assert_eq!(unpack(STRUCTURE_SENTINEL).data_type, 2);
    }

    #[test]
    fn annotation_roundtrip() {
        let decl = annotation("INTEGER", 12288);
        assert_eq!(decl, "INTEGER 12288");
        assert_eq!(parse_annotation(&decl), Some(12288));
    }

    #[test]
    fn parse_tolerates_whitespace() {
        assert_eq!(parse_annotation("  TEXT   274  "), Some(274));
        assert_eq!(parse_annotation("NUMERIC\t51"), Some(51));
    }

    #[test]
    fn parse_rejects_missing_suffix() {
        assert_eq!(parse_annotation("INTEGER"), None);
        assert_eq!(parse_annotation(""), None);
        assert_eq!(parse_annotation("TEXT  "), None);
    }

    #[test]
    fn parse_takes_only_the_trailing_run() {
        // The base may itself contain digits; only the suffix counts.
        assert_eq!(parse_annotation("VARCHAR2 96"), Some(96));
    }
}
