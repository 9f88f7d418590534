//! # Column Codecs
//!
//! One decode/encode pair per column data type, behind a single dispatch.
//! Decode takes the row count, the values-chunk bytes (padding included)
//! and the blob payload (empty when the blob chunk was absent) and yields
//! one [`Value`] per row; encode inverts that into fresh values bytes and
//! an optional blob payload.
//!
//! Layout rules worth restating:
//!
//! - Fixed-stride values: 4 bytes for types 0/1/2/10/11, 1 for type 4,
//!   2 for type 5. Type 3 packs bits LSB-first into `ceil(n / 8)` bytes;
//!   bits past the last row are ignored on read and zero on write.
//! - String lengths count the trailing NUL. A zero length decodes to an
//!   empty string and consumes nothing; the encoder always writes a lone
//!   NUL (length 1) for an empty string, which is what the game's own
//!   converter emits.
//! - A blob-typed column whose payload would be empty omits its blob
//!   chunk; decoding treats the missing blob as zero-length.
//! - Float words are reinterpreted bit-for-bit, never cast.

use crate::cursor::Reader;
use crate::error::CdbError;
use crate::values::{DataType, Value};
use eyre::{ensure, Result};

/// Materializes one column into per-row values.
pub fn decode_column(
    data_type: DataType,
    row_count: u32,
    values: &[u8],
    blob: &[u8],
) -> Result<Vec<Value>> {
    let n = row_count as usize;
    let mut vals = Reader::new(values);
    let mut rows = Vec::with_capacity(n);

    match data_type {
        DataType::Integer => {
            for _ in 0..n {
                rows.push(Value::Int(vals.read_u32()? as i32 as i64));
            }
        }
        DataType::Float => {
            for _ in 0..n {
                rows.push(Value::Float(f32::from_bits(vals.read_u32()?)));
            }
        }
        DataType::IntegerByte => {
            for _ in 0..n {
                rows.push(Value::Int(vals.read_bytes(1)?[0] as i8 as i64));
            }
        }
        DataType::IntegerShort => {
            for _ in 0..n {
                let bytes = vals.read_bytes(2)?;
                rows.push(Value::Int(
                    u16::from_le_bytes(bytes.try_into().unwrap()) as i64, // length checked by read_bytes
                ));
            }
        }
        DataType::Boolean => {
            let packed = vals.read_bytes(n.div_ceil(8))?;
            for i in 0..n {
                rows.push(Value::Bool(packed[i / 8] >> (i % 8) & 1 != 0));
            }
        }
        DataType::String => {
            let mut payload = Reader::new(blob);
            for _ in 0..n {
                let len = vals.read_u32()? as usize;
                rows.push(Value::Text(read_string(&mut payload, len)?));
            }
        }
        DataType::FloatList => {
            let mut payload = Reader::new(blob);
            for _ in 0..n {
                let count = vals.read_u32()? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(f32::from_bits(payload.read_u32()?));
                }
                rows.push(Value::FloatList(items));
            }
        }
        DataType::IntegerList => {
            let mut payload = Reader::new(blob);
            for _ in 0..n {
                let count = vals.read_u32()? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(payload.read_u32()? as i32);
                }
                rows.push(Value::IntList(items));
            }
        }
    }

    Ok(rows)
}

/// Serializes one column into values bytes and an optional blob payload.
pub fn encode_column(data_type: DataType, rows: &[Value]) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let mut values = Vec::new();
    let mut blob = Vec::new();

    match data_type {
        DataType::Integer => {
            for row in rows {
                let v = expect_int(row)?;
                let narrow: i32 = v.try_into().map_err(|_| CdbError::OutOfRange {
                    value: v,
                    data_type,
                })?;
                values.extend_from_slice(&narrow.to_le_bytes());
            }
        }
        DataType::Float => {
            for row in rows {
                let Value::Float(f) = row else {
                    return mismatch(data_type, row);
                };
                values.extend_from_slice(&f.to_bits().to_le_bytes());
            }
        }
        DataType::IntegerByte => {
            for row in rows {
                let v = expect_int(row)?;
                let narrow: i8 = v.try_into().map_err(|_| CdbError::OutOfRange {
                    value: v,
                    data_type,
                })?;
                values.push(narrow as u8);
            }
        }
        DataType::IntegerShort => {
            for row in rows {
                let v = expect_int(row)?;
                let narrow: u16 = v.try_into().map_err(|_| CdbError::OutOfRange {
                    value: v,
                    data_type,
                })?;
                values.extend_from_slice(&narrow.to_le_bytes());
            }
        }
        DataType::Boolean => {
            values = vec![0u8; rows.len().div_ceil(8)];
            for (i, row) in rows.iter().enumerate() {
                let Value::Bool(b) = row else {
                    return mismatch(data_type, row);
                };
                if *b {
                    values[i / 8] |= 1 << (i % 8);
                }
            }
        }
        DataType::String => {
            for row in rows {
                let Value::Text(s) = row else {
                    return mismatch(data_type, row);
                };
                values.extend_from_slice(&(s.len() as u32 + 1).to_le_bytes());
                blob.extend_from_slice(s.as_bytes());
                blob.push(0);
            }
        }
        DataType::FloatList => {
            for row in rows {
                let Value::FloatList(items) = row else {
                    return mismatch(data_type, row);
                };
                values.extend_from_slice(&(items.len() as u32).to_le_bytes());
                for f in items {
                    blob.extend_from_slice(&f.to_bits().to_le_bytes());
                }
            }
        }
        DataType::IntegerList => {
            for row in rows {
                let Value::IntList(items) = row else {
                    return mismatch(data_type, row);
                };
                values.extend_from_slice(&(items.len() as u32).to_le_bytes());
                for v in items {
                    blob.extend_from_slice(&v.to_le_bytes());
                }
            }
        }
    }

    let blob = if blob.is_empty() { None } else { Some(blob) };
    Ok((values, blob))
}

fn read_string(payload: &mut Reader<'_>, len: usize) -> Result<String> {
    if len == 0 {
        return Ok(String::new());
    }
    let offset = payload.position();
    let bytes = payload.read_bytes(len)?;
    ensure!(
        bytes[len - 1] == 0,
        "string at blob offset {} is not NUL-terminated",
        offset
    );
    let text = std::str::from_utf8(&bytes[..len - 1])
        .map_err(|e| eyre::eyre!("string at blob offset {} is not UTF-8: {}", offset, e))?;
    Ok(text.to_string())
}

fn expect_int(row: &Value) -> Result<i64> {
    match row {
        Value::Int(v) => Ok(*v),
        other => Err(eyre::eyre!("integer column holds {:?}", other)),
    }
}

fn mismatch<T>(data_type: DataType, row: &Value) -> Result<T> {
    Err(eyre::eyre!("{:?} column holds {:?}", data_type, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data_type: DataType, rows: Vec<Value>) {
        let (values, blob) = encode_column(data_type, &rows).unwrap();
        let decoded = decode_column(
            data_type,
            rows.len() as u32,
            &values,
            blob.as_deref().unwrap_or(&[]),
        )
        .unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn integer_roundtrip() {
        roundtrip(
            DataType::Integer,
            vec![Value::Int(1), Value::Int(-2), Value::Int(3)],
        );
    }

    #[test]
    fn integer_rejects_wider_than_word() {
        let err = encode_column(DataType::Integer, &[Value::Int(1_i64 << 40)]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CdbError>(),
            Some(CdbError::OutOfRange { .. })
        ));
    }

    #[test]
    fn float_bits_survive() {
        // A quiet NaN with payload bits; numeric comparison would lie.
        let odd = f32::from_bits(0x7FC0_1234);
        let (values, blob) = encode_column(DataType::Float, &[Value::Float(odd)]).unwrap();
        assert!(blob.is_none());
        assert_eq!(values, 0x7FC0_1234u32.to_le_bytes());
        let decoded = decode_column(DataType::Float, 1, &values, &[]).unwrap();
        let Value::Float(back) = decoded[0] else {
            panic!("expected float");
        };
        assert_eq!(back.to_bits(), 0x7FC0_1234);
    }

    #[test]
    fn boolean_packs_lsb_first() {
        let rows: Vec<Value> = [
            true, false, true, true, false, false, false, true, true, false,
        ]
        .iter()
        .map(|b| Value::Bool(*b))
        .collect();

        let (values, blob) = encode_column(DataType::Boolean, &rows).unwrap();
        assert!(blob.is_none());
        assert_eq!(values, vec![0b1000_1101, 0b0000_0001]);

        let decoded = decode_column(DataType::Boolean, 10, &values, &[]).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn boolean_ignores_padding_bits_on_read() {
        // High bits of the last byte are garbage; rows must not see them.
        let decoded = decode_column(DataType::Boolean, 3, &[0b1111_1010], &[]).unwrap();
        assert_eq!(
            decoded,
            vec![Value::Bool(false), Value::Bool(true), Value::Bool(false)]
        );
    }

    #[test]
    fn string_lengths_and_blob_layout() {
        let rows = vec![
            Value::Text("hi".into()),
            Value::Text("".into()),
            Value::Text("world".into()),
        ];
        let (values, blob) = encode_column(DataType::String, &rows).unwrap();
        let lengths: Vec<u32> = values
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(lengths, vec![3, 1, 6]);
        assert_eq!(blob.as_deref(), Some(b"hi\0\0world\0".as_slice()));

        let decoded = decode_column(DataType::String, 3, &values, blob.as_deref().unwrap()).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn zero_length_string_consumes_no_blob_bytes() {
        // Length 0 (no NUL at all) decodes to an empty string.
        let values: Vec<u8> = [0u32, 3u32]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let decoded = decode_column(DataType::String, 2, &values, b"hi\0").unwrap();
        assert_eq!(
            decoded,
            vec![Value::Text("".into()), Value::Text("hi".into())]
        );
    }

    #[test]
    fn byte_and_short_subwidths() {
        roundtrip(
            DataType::IntegerByte,
            vec![Value::Int(-128), Value::Int(0), Value::Int(127)],
        );
        roundtrip(
            DataType::IntegerShort,
            vec![Value::Int(0), Value::Int(65_535)],
        );

        for (dt, v) in [
            (DataType::IntegerByte, 128),
            (DataType::IntegerByte, -129),
            (DataType::IntegerShort, -1),
            (DataType::IntegerShort, 65_536),
        ] {
            let err = encode_column(dt, &[Value::Int(v)]).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<CdbError>(),
                    Some(CdbError::OutOfRange { value, .. }) if *value == v
                ),
                "expected OutOfRange for {:?} {}",
                dt,
                v
            );
        }
    }

    #[test]
    fn float_list_roundtrip_and_blob_omission() {
        roundtrip(
            DataType::FloatList,
            vec![
                Value::FloatList(vec![1.0]),
                Value::FloatList(vec![1.0, 2.0]),
                Value::FloatList(vec![]),
            ],
        );

        // All-empty lists produce no payload, so no blob chunk at all.
        let (values, blob) = encode_column(
            DataType::FloatList,
            &[Value::FloatList(vec![]), Value::FloatList(vec![])],
        )
        .unwrap();
        assert_eq!(values.len(), 8);
        assert!(blob.is_none());
        let decoded = decode_column(DataType::FloatList, 2, &values, &[]).unwrap();
        assert_eq!(
            decoded,
            vec![Value::FloatList(vec![]), Value::FloatList(vec![])]
        );
    }

    #[test]
    fn integer_list_roundtrip() {
        roundtrip(
            DataType::IntegerList,
            vec![
                Value::IntList(vec![1, -2, 3]),
                Value::IntList(vec![]),
                Value::IntList(vec![i32::MIN, i32::MAX]),
            ],
        );
    }

    #[test]
    fn empty_column_has_empty_values_and_no_blob() {
        for dt in [
            DataType::Integer,
            DataType::Float,
            DataType::String,
            DataType::Boolean,
            DataType::IntegerByte,
            DataType::IntegerShort,
            DataType::FloatList,
            DataType::IntegerList,
        ] {
            let (values, blob) = encode_column(dt, &[]).unwrap();
            assert!(values.is_empty(), "{:?} values not empty", dt);
            assert!(blob.is_none(), "{:?} blob not omitted", dt);
            assert_eq!(decode_column(dt, 0, &values, &[]).unwrap(), vec![]);
        }
    }

    #[test]
    fn truncated_values_chunk_is_short_read() {
        let err = decode_column(DataType::Integer, 2, &[1, 0, 0, 0], &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CdbError>(),
            Some(CdbError::ShortRead { .. })
        ));
    }

    #[test]
    fn missing_blob_with_nonzero_lengths_is_short_read() {
        let values = 3u32.to_le_bytes();
        let err = decode_column(DataType::String, 1, &values, &[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CdbError>(),
            Some(CdbError::ShortRead { .. })
        ));
    }

    #[test]
    fn values_padding_is_ignored() {
        // A one-row byte column arrives with 3 bytes of body padding.
        let decoded = decode_column(DataType::IntegerByte, 1, &[0xFE, 0, 0, 0], &[]).unwrap();
        assert_eq!(decoded, vec![Value::Int(-2)]);
    }
}
