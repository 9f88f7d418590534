//! # Column Data Types and Cell Values
//!
//! This module provides the canonical `DataType` enum for CDB columns and
//! the `Value` sum type the codec moves between the binary format and the
//! SQLite mirror.
//!
//! ## Data Types
//!
//! | Tag | Name | Values layout | Blob | Relational form |
//! |-----|------|---------------|------|-----------------|
//! | 0 | INTEGER | 4-byte signed words | — | signed integer |
//! | 1 | FLOAT | IEEE-754 singles as words | — | real |
//! | 2 | STRING | byte lengths (incl. NUL) | NUL-terminated UTF-8 | text |
//! | 3 | BOOLEAN | LSB-first bit packing | — | 0/1 integer |
//! | 4 | INTEGER_BYTE | signed 8-bit | — | signed integer |
//! | 5 | INTEGER_SHORT | unsigned 16-bit | — | unsigned integer |
//! | 10 | FLOAT_LIST | element counts | IEEE-754 singles | text `(v1,v2,…)` |
//! | 11 | INTEGER_LIST | element counts | 4-byte signed words | text `(v1,v2,…)` |
//!
//! The discriminant is the on-disk enumerant; the gap between 5 and 10 is
//! the format's, not ours.
//!
//! ## List Text Grammar
//!
//! Lists cross the relational boundary as text: `(v1,v2,…)`, `()` when
//! empty. Floats format to six decimal places with trailing fractional
//! zeros stripped, then a lone trailing point stripped; a whole-number
//! element regains a `.0` suffix only when the list has more than one
//! element. Parsing strips the outer parentheses, splits on commas, trims
//! each field, and converts; any violation is
//! [`CdbError::MalformedList`].

use crate::error::CdbError;
use eyre::Result;
use rusqlite::types::{ToSqlOutput, Value as SqlValue};
use rusqlite::ToSql;

/// Canonical column data type, discriminants as stored on disk.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer = 0,
    Float = 1,
    String = 2,
    Boolean = 3,
    IntegerByte = 4,
    IntegerShort = 5,
    FloatList = 10,
    IntegerList = 11,
}

impl DataType {
    /// SQL base type used in the column's declared type annotation.
    pub fn sql_base(&self) -> &'static str {
        match self {
            DataType::Float => "REAL",
            DataType::String | DataType::FloatList | DataType::IntegerList => "TEXT",
            DataType::Integer | DataType::IntegerByte | DataType::IntegerShort => "INTEGER",
            DataType::Boolean => "NUMERIC",
        }
    }

    /// Returns true if this type carries a secondary blob chunk.
    pub fn has_blob(&self) -> bool {
        matches!(
            self,
            DataType::String | DataType::FloatList | DataType::IntegerList
        )
    }
}

impl TryFrom<u32> for DataType {
    type Error = CdbError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DataType::Integer),
            1 => Ok(DataType::Float),
            2 => Ok(DataType::String),
            3 => Ok(DataType::Boolean),
            4 => Ok(DataType::IntegerByte),
            5 => Ok(DataType::IntegerShort),
            10 => Ok(DataType::FloatList),
            11 => Ok(DataType::IntegerList),
            other => Err(CdbError::UnknownDataType(other)),
        }
    }
}

/// One relational cell, across all eight physical encodings.
///
/// Floats stay `f32` end to end; widening to `f64` happens only at the
/// SQLite binding boundary, and the binary side reinterprets bits rather
/// than casting, so float words survive the trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
    Text(String),
    Bool(bool),
    IntList(Vec<i32>),
    FloatList(Vec<f32>),
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f as f64)),
            Value::Text(s) => ToSqlOutput::Borrowed(s.as_str().into()),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Value::IntList(items) => ToSqlOutput::Owned(SqlValue::Text(format_int_list(items))),
            Value::FloatList(items) => ToSqlOutput::Owned(SqlValue::Text(format_float_list(items))),
        })
    }
}

/// Formats an integer list as `(v1,v2,…)`.
pub fn format_int_list(items: &[i32]) -> String {
    let mut out = String::from("(");
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(')');
    out
}

/// Formats a float list as `(v1,v2,…)` under the six-decimal rule.
pub fn format_float_list(items: &[f32]) -> String {
    let multi = items.len() > 1;
    let mut out = String::from("(");
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format_float_element(*v, multi));
    }
    out.push(')');
    out
}

fn format_float_element(value: f32, multi: bool) -> String {
    let mut s = format!("{:.6}", value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if multi && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Parses `(v1,v2,…)` into signed 32-bit integers.
pub fn parse_int_list(text: &str) -> Result<Vec<i32>> {
    parse_list(text, |field| field.parse::<i32>().ok())
}

/// Parses `(v1,v2,…)` into IEEE-754 singles.
pub fn parse_float_list(text: &str) -> Result<Vec<f32>> {
    parse_list(text, |field| field.parse::<f32>().ok())
}

fn parse_list<T>(text: &str, convert: impl Fn(&str) -> Option<T>) -> Result<Vec<T>> {
    let malformed = || CdbError::MalformedList(text.to_string());

    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|field| convert(field.trim()).ok_or_else(|| malformed().into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_roundtrips_through_discriminant() {
        for tag in [0u32, 1, 2, 3, 4, 5, 10, 11] {
            let dt = DataType::try_from(tag).unwrap();
            assert_eq!(dt as u32, tag);
        }
    }

    #[test]
    fn data_type_rejects_gaps() {
        for tag in [6u32, 7, 8, 9, 12, 255] {
            assert!(matches!(
                DataType::try_from(tag),
                Err(CdbError::UnknownDataType(t)) if t == tag
            ));
        }
    }

    #[test]
    fn sql_base_mapping() {
        assert_eq!(DataType::Float.sql_base(), "REAL");
        assert_eq!(DataType::String.sql_base(), "TEXT");
        assert_eq!(DataType::FloatList.sql_base(), "TEXT");
        assert_eq!(DataType::IntegerList.sql_base(), "TEXT");
        assert_eq!(DataType::Integer.sql_base(), "INTEGER");
        assert_eq!(DataType::IntegerByte.sql_base(), "INTEGER");
        assert_eq!(DataType::IntegerShort.sql_base(), "INTEGER");
        assert_eq!(DataType::Boolean.sql_base(), "NUMERIC");
    }

    #[test]
    fn float_list_formatting_table() {
        assert_eq!(format_float_list(&[]), "()");
        assert_eq!(format_float_list(&[1.0]), "(1)");
        assert_eq!(format_float_list(&[1.0, 2.0]), "(1.0,2.0)");
        assert_eq!(format_float_list(&[1.5]), "(1.5)");
        assert_eq!(format_float_list(&[1.5, 0.25]), "(1.5,0.25)");
        assert_eq!(format_float_list(&[-3.0, 0.0]), "(-3.0,0.0)");
        assert_eq!(format_float_list(&[0.125]), "(0.125)");
    }

    #[test]
    fn six_decimal_truncation() {
        // 1/3 is not representable; six places then strip.
        let one_third = 1.0f32 / 3.0;
        assert_eq!(format_float_list(&[one_third]), "(0.333333)");
    }

    #[test]
    fn int_list_formatting() {
        assert_eq!(format_int_list(&[]), "()");
        assert_eq!(format_int_list(&[7]), "(7)");
        assert_eq!(format_int_list(&[1, -2, 3]), "(1,-2,3)");
    }

    #[test]
    fn parse_int_list_roundtrip() {
        assert_eq!(parse_int_list("(1,-2,3)").unwrap(), vec![1, -2, 3]);
        assert_eq!(parse_int_list("()").unwrap(), Vec::<i32>::new());
        assert_eq!(parse_int_list(" ( 4 , 5 ) ").unwrap(), vec![4, 5]);
    }

    #[test]
    fn parse_float_list_accepts_whole_and_fractional() {
        assert_eq!(parse_float_list("(1)").unwrap(), vec![1.0]);
        assert_eq!(parse_float_list("(1.0,2.0)").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn parse_rejects_malformed_lists() {
        for bad in ["1,2", "(1,2", "1,2)", "(a,b)", "(1;2)", ""] {
            let err = parse_int_list(bad).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<CdbError>(), Some(CdbError::MalformedList(_))),
                "expected MalformedList for {:?}",
                bad
            );
        }
    }

    #[test]
    fn parse_rejects_empty_field_between_commas() {
        assert!(parse_int_list("(1,,2)").is_err());
    }

    #[test]
    fn value_binds_lists_as_text() {
        let v = Value::FloatList(vec![1.0, 2.0]);
        match v.to_sql().unwrap() {
            ToSqlOutput::Owned(SqlValue::Text(s)) => assert_eq!(s, "(1.0,2.0)"),
            other => panic!("unexpected binding: {:?}", other),
        }
    }
}
