//! # Encoder Pipeline
//!
//! SQLite mirror → schema inspection → row-to-column transposition →
//! typed column serialization → chunk emission with deferred size
//! back-patching → zlib framing.
//!
//! The inspector enumerates tables through `DB_STRUCTURE` in ascending
//! identifier order and recovers each column's CDB metadata from the
//! trailing integer of its declared SQL type. Children are emitted in the
//! order the game's own converter writes them: `TABLE_ID`, `ROW_COUNT`,
//! `TABLE_FLAGS`, `COLUMN_DEFINITIONS` inside a table; `COLUMN_INDEX`,
//! `COLUMN_DATA_TYPE`, `COLUMN_VALUES`, then the blob chunk (present only
//! when the column has payload bytes) inside a column.

use crate::chunk::{ChunkKind, ChunkWriter};
use crate::columns;
use crate::compress;
use crate::decode::{quote_ident, DATABASE_FLAGS_VALUE, STRUCTURE_TABLE, WRAPPER_DESCRIPTION};
use crate::error::CdbError;
use crate::flags;
use crate::meta;
use crate::values::{self, DataType, Value};
use eyre::{ensure, Result, WrapErr};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Encodes the relational mirror back into a compressed CDB file.
pub fn encode(conn: &Connection) -> Result<Vec<u8>> {
    let tables = inspect(conn)?;
    let stream = write_stream(conn, &tables)?;
    compress::compress(&stream)
}

/// One table's encode plan, recovered from the schema.
struct TablePlan {
    name: String,
    id: u32,
    columns: Vec<ColumnPlan>,
}

struct ColumnPlan {
    name: String,
    index: u32,
    data_type: DataType,
}

/// Enumerates tables via DB_STRUCTURE, ascending identifier.
fn inspect(conn: &Connection) -> Result<Vec<TablePlan>> {
    let sql = format!(
        "SELECT name, id FROM {} ORDER BY id ASC",
        quote_ident(STRUCTURE_TABLE)
    );
    let mut stmt = conn
        .prepare(&sql)
        .wrap_err("failed to read DB_STRUCTURE; is this a decoded database?")?;

    let mut tables = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let id: Option<i64> = row.get(1)?;
        let id = id.ok_or_else(|| CdbError::NullTableId {
            table: name.clone(),
        })? as u32;

        let columns = inspect_columns(conn, &name)
            .wrap_err_with(|| format!("inspecting table {:?}", name))?;
        tables.push(TablePlan { name, id, columns });
    }

    Ok(tables)
}

/// Recovers per-column metadata from the declared type annotations.
fn inspect_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnPlan>> {
    let sql = format!("PRAGMA table_info({})", quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;

    let mut columns = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get("name")?;
        let declared: String = row.get("type")?;
        let n = meta::parse_annotation(&declared).ok_or_else(|| {
            eyre::eyre!(
                "column {:?} declared as {:?} carries no metadata annotation",
                name,
                declared
            )
        })?;
        let unpacked = meta::unpack(n);
        let data_type = DataType::try_from(unpacked.data_type)?;
        columns.push(ColumnPlan {
            name,
            index: unpacked.column_index,
            data_type,
        });
    }

    ensure!(!columns.is_empty(), "table {:?} has no columns", table);
    Ok(columns)
}

/// Loads a table and transposes it into per-column value vectors.
fn load_columns(conn: &Connection, table: &TablePlan) -> Result<(u32, Vec<Vec<Value>>)> {
    let column_list = table
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {} FROM {}",
        column_list,
        quote_ident(&table.name)
    );

    let mut columns: Vec<Vec<Value>> = table.columns.iter().map(|_| Vec::new()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut row_count = 0u32;
    while let Some(row) = rows.next()? {
        for (i, plan) in table.columns.iter().enumerate() {
            let cell = from_sql(plan.data_type, row.get_ref(i)?)
                .wrap_err_with(|| format!("reading {:?}.{:?}", table.name, plan.name))?;
            columns[i].push(cell);
        }
        row_count += 1;
    }

    Ok((row_count, columns))
}

/// Converts one SQLite cell into the codec value for its column type.
///
/// NULLs (the editing layer may leave them) become the type's zero value;
/// the format itself has no NULL notion.
fn from_sql(data_type: DataType, cell: ValueRef<'_>) -> Result<Value> {
    match data_type {
        DataType::Integer | DataType::IntegerByte | DataType::IntegerShort => match cell {
            ValueRef::Integer(i) => Ok(Value::Int(i)),
            ValueRef::Null => Ok(Value::Int(0)),
            other => mismatch(data_type, other),
        },
        DataType::Float => match cell {
            ValueRef::Real(f) => Ok(Value::Float(f as f32)),
            ValueRef::Integer(i) => Ok(Value::Float(i as f32)),
            ValueRef::Null => Ok(Value::Float(0.0)),
            other => mismatch(data_type, other),
        },
        DataType::Boolean => match cell {
            ValueRef::Integer(i) => Ok(Value::Bool(i != 0)),
            ValueRef::Null => Ok(Value::Bool(false)),
            other => mismatch(data_type, other),
        },
        DataType::String => match cell {
            ValueRef::Text(bytes) => Ok(Value::Text(utf8(bytes)?.to_string())),
            ValueRef::Null => Ok(Value::Text(String::new())),
            other => mismatch(data_type, other),
        },
        DataType::FloatList => match cell {
            ValueRef::Text(bytes) => Ok(Value::FloatList(values::parse_float_list(utf8(bytes)?)?)),
            ValueRef::Null => Ok(Value::FloatList(Vec::new())),
            other => mismatch(data_type, other),
        },
        DataType::IntegerList => match cell {
            ValueRef::Text(bytes) => Ok(Value::IntList(values::parse_int_list(utf8(bytes)?)?)),
            ValueRef::Null => Ok(Value::IntList(Vec::new())),
            other => mismatch(data_type, other),
        },
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| eyre::eyre!("cell text is not UTF-8: {}", e))
}

fn mismatch(data_type: DataType, cell: ValueRef<'_>) -> Result<Value> {
    Err(eyre::eyre!(
        "{:?} column holds incompatible {:?} cell",
        data_type,
        cell.data_type()
    ))
}

fn write_stream(conn: &Connection, tables: &[TablePlan]) -> Result<Vec<u8>> {
    let mut w = ChunkWriter::new();

    w.open(ChunkKind::Wrapper, Some(WRAPPER_DESCRIPTION));

    w.open(ChunkKind::DatabaseFlags, None);
    w.put_u32(DATABASE_FLAGS_VALUE);
    w.close()?;

    w.open(ChunkKind::DatabaseTables, None);
    w.begin_array(tables.len() as u32);
    for table in tables {
        write_table(&mut w, conn, table)?;
    }
    w.end_array();
    w.close()?;

    w.close()?;
    w.finalize()
}

fn write_table(w: &mut ChunkWriter, conn: &Connection, table: &TablePlan) -> Result<()> {
    let table_flags =
        flags::lookup(table.id).ok_or(CdbError::UnknownTableId(table.id))?;
    let (row_count, columns) = load_columns(conn, table)?;

    tracing::debug!(
        table = %table.name,
        id = table.id,
        rows = row_count,
        columns = columns.len(),
        "encoding table"
    );

    w.open(ChunkKind::Table, Some(&table.name));

    w.open(ChunkKind::TableId, None);
    w.put_u32(table.id);
    w.close()?;

    w.open(ChunkKind::RowCount, None);
    w.put_u32(row_count);
    w.close()?;

    w.open(ChunkKind::TableFlags, None);
    w.put_u32(table_flags);
    w.close()?;

    w.open(ChunkKind::ColumnDefinitions, None);
    w.begin_array(table.columns.len() as u32);
    for (plan, rows) in table.columns.iter().zip(&columns) {
        write_column(w, plan, rows)
            .wrap_err_with(|| format!("encoding {:?}.{:?}", table.name, plan.name))?;
    }
    w.end_array();
    w.close()?;

    w.close()
}

fn write_column(w: &mut ChunkWriter, plan: &ColumnPlan, rows: &[Value]) -> Result<()> {
    let (values, blob) = columns::encode_column(plan.data_type, rows)?;

    tracing::trace!(
        column = %plan.name,
        index = plan.index,
        data_type = ?plan.data_type,
        values = values.len(),
        blob = blob.as_ref().map_or(0, Vec::len),
        "encoded column"
    );

    w.open(ChunkKind::Column, Some(&plan.name));

    w.open(ChunkKind::ColumnIndex, None);
    w.put_u32(plan.index);
    w.close()?;

    w.open(ChunkKind::ColumnDataType, None);
    w.put_u32(plan.data_type as u32);
    w.close()?;

    w.open(ChunkKind::ColumnValues, None);
    w.put_bytes(&values);
    w.close()?;

    if let Some(payload) = blob {
        w.open(ChunkKind::ColumnBlobData, None);
        w.put_u32(payload.len() as u32);
        w.put_bytes(&payload);
        w.close()?;
    }

    w.close()
}
