//! # Decoder Pipeline
//!
//! Raw bytes → optional zlib inflate → recursive chunk descent → typed
//! column materialization → relational build into a
//! [`rusqlite::Connection`].
//!
//! The chunk tree is walked without imposing child order inside `TABLE`
//! or `COLUMN`; each child's kind identifies its role. Because the row
//! count may arrive after the column definitions, column bodies are kept
//! as raw bytes until the whole table is assembled, then materialized in
//! one pass.
//!
//! The relational mirror gets one table per CDB table with columns in
//! their original physical order, each declared as `'<BASE> <N>'` where
//! `N` packs the table id, column index, and data type, plus the
//! synthetic `DB_STRUCTURE` table mapping table names to identifiers.
//! Inserts batch `floor(999 / column_count)` rows per statement to stay
//! under SQLite's bound-parameter limit.

use crate::chunk::{ChunkHeader, ChunkKind, ChunkReader};
use crate::columns;
use crate::compress;
use crate::error::CdbError;
use crate::meta;
use crate::values::{DataType, Value};
use eyre::{ensure, Result, WrapErr};
use rusqlite::{params, params_from_iter, Connection};

/// Description string carried by every root wrapper chunk.
pub const WRAPPER_DESCRIPTION: &str = "cyanide database";

/// Fixed value of the DATABASE_FLAGS chunk.
pub const DATABASE_FLAGS_VALUE: u32 = 274;

/// SQLite's bound-parameter ceiling; insert batches stay under it.
const MAX_BOUND_PARAMS: usize = 999;

/// Name of the synthetic table-directory table.
pub const STRUCTURE_TABLE: &str = "DB_STRUCTURE";

/// Decodes a CDB file into a fresh in-memory SQLite database.
pub fn decode(input: &[u8]) -> Result<Connection> {
    let conn = Connection::open_in_memory().wrap_err("failed to open in-memory database")?;
    decode_into(input, &conn)?;
    Ok(conn)
}

/// Decodes a CDB file into an existing (empty) SQLite connection.
pub fn decode_into(input: &[u8], conn: &Connection) -> Result<()> {
    let stream = compress::decompress(input)?;
    let tables = parse_stream(&stream)?;
    build_database(conn, &tables)
}

/// One fully assembled CDB table.
struct CdbTable {
    name: String,
    id: u32,
    row_count: u32,
    columns: Vec<CdbColumn>,
}

struct CdbColumn {
    name: String,
    index: u32,
    data_type: DataType,
    rows: Vec<Value>,
}

/// A column mid-assembly: bodies stay raw until the row count is known.
#[derive(Default)]
struct RawColumn {
    name: String,
    index: Option<u32>,
    data_type: Option<u32>,
    values: Option<Vec<u8>>,
    blob: Option<Vec<u8>>,
}

fn parse_stream(stream: &[u8]) -> Result<Vec<CdbTable>> {
    let mut r = ChunkReader::new(stream);

    let wrapper = r.begin(stream.len())?;
    ensure!(
        wrapper.kind == ChunkKind::Wrapper,
        "root chunk is {:?}, not a wrapper",
        wrapper.kind
    );
    ensure!(
        wrapper.description.as_deref() == Some(WRAPPER_DESCRIPTION),
        "wrapper description is {:?}",
        wrapper.description
    );

    let mut flags = None;
    let mut tables = None;

    while r.position() < wrapper.body_end() {
        let child = r.begin(wrapper.body_end())?;
        match child.kind {
            ChunkKind::DatabaseFlags => {
                let value = r.read_u32()?;
                ensure!(
                    value == DATABASE_FLAGS_VALUE,
                    "database flags word is {}, expected {}",
                    value,
                    DATABASE_FLAGS_VALUE
                );
                flags = Some(value);
            }
            ChunkKind::DatabaseTables => tables = Some(parse_tables(&mut r, &child)?),
            other => eyre::bail!("unexpected {:?} chunk inside wrapper", other),
        }
        r.finish(&child)?;
    }
    r.finish(&wrapper)?;

    if flags.is_none() {
        return Err(missing_child("WRAPPER", "DATABASE_FLAGS").into());
    }
    tables.ok_or_else(|| missing_child("WRAPPER", "DATABASE_TABLES").into())
}

fn parse_tables(r: &mut ChunkReader<'_>, header: &ChunkHeader) -> Result<Vec<CdbTable>> {
    let count = r.begin_array()?;
    let mut tables = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let child = r.begin(header.body_end())?;
        ensure!(
            child.kind == ChunkKind::Table,
            "tables array holds {:?} chunk",
            child.kind
        );
        tables.push(parse_table(r, &child)?);
        r.finish(&child)?;
    }
    r.finish_array()?;
    Ok(tables)
}

fn parse_table(r: &mut ChunkReader<'_>, header: &ChunkHeader) -> Result<CdbTable> {
    let name = header.description.clone().unwrap_or_default();

    let mut id = None;
    let mut row_count = None;
    let mut raw_columns = None;

    while r.position() < header.body_end() {
        let child = r.begin(header.body_end())?;
        match child.kind {
            ChunkKind::TableId => id = Some(r.read_u32()?),
            ChunkKind::RowCount => row_count = Some(r.read_u32()?),
            // Opaque flags word; tolerated absent, not mirrored.
            ChunkKind::TableFlags => {
                r.read_u32()?;
            }
            ChunkKind::ColumnDefinitions => {
                raw_columns = Some(parse_column_definitions(r, &child)?)
            }
            other => eyre::bail!("unexpected {:?} chunk inside table {:?}", other, name),
        }
        r.finish(&child)?;
    }

    let id = id.ok_or_else(|| missing_child("TABLE", "TABLE_ID"))?;
    let row_count = row_count.ok_or_else(|| missing_child("TABLE", "ROW_COUNT"))?;
    let raw_columns =
        raw_columns.ok_or_else(|| missing_child("TABLE", "COLUMN_DEFINITIONS"))?;

    let columns = raw_columns
        .into_iter()
        .map(|raw| materialize_column(raw, row_count))
        .collect::<Result<Vec<_>>>()
        .wrap_err_with(|| format!("materializing table {:?}", name))?;

    tracing::debug!(
        table = %name,
        id,
        rows = row_count,
        columns = columns.len(),
        "decoded table"
    );

    Ok(CdbTable {
        name,
        id,
        row_count,
        columns,
    })
}

fn parse_column_definitions(
    r: &mut ChunkReader<'_>,
    header: &ChunkHeader,
) -> Result<Vec<RawColumn>> {
    let count = r.begin_array()?;
    let mut columns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let child = r.begin(header.body_end())?;
        ensure!(
            child.kind == ChunkKind::Column,
            "column definitions array holds {:?} chunk",
            child.kind
        );
        columns.push(parse_column(r, &child)?);
        r.finish(&child)?;
    }
    r.finish_array()?;
    Ok(columns)
}

fn parse_column(r: &mut ChunkReader<'_>, header: &ChunkHeader) -> Result<RawColumn> {
    let mut raw = RawColumn {
        name: header.description.clone().unwrap_or_default(),
        ..RawColumn::default()
    };

    while r.position() < header.body_end() {
        let child = r.begin(header.body_end())?;
        match child.kind {
            ChunkKind::ColumnIndex => raw.index = Some(r.read_u32()?),
            ChunkKind::ColumnDataType => raw.data_type = Some(r.read_u32()?),
            ChunkKind::ColumnValues => raw.values = Some(r.read_body(&child)?.to_vec()),
            ChunkKind::ColumnBlobData => {
                let size = r.read_u32()? as usize;
                raw.blob = Some(r.read_bytes(size)?.to_vec());
            }
            other => eyre::bail!("unexpected {:?} chunk inside column {:?}", other, raw.name),
        }
        r.finish(&child)?;
    }

    Ok(raw)
}

fn materialize_column(raw: RawColumn, row_count: u32) -> Result<CdbColumn> {
    let index = raw
        .index
        .ok_or_else(|| missing_child("COLUMN", "COLUMN_INDEX"))?;
    let tag = raw
        .data_type
        .ok_or_else(|| missing_child("COLUMN", "COLUMN_DATA_TYPE"))?;
    let values = raw
        .values
        .ok_or_else(|| missing_child("COLUMN", "COLUMN_VALUES"))?;

    let data_type = DataType::try_from(tag)?;
    let rows = columns::decode_column(
        data_type,
        row_count,
        &values,
        raw.blob.as_deref().unwrap_or(&[]),
    )
    .wrap_err_with(|| format!("decoding column {:?}", raw.name))?;

    tracing::trace!(
        column = %raw.name,
        index,
        data_type = ?data_type,
        values = values.len(),
        blob = raw.blob.as_ref().map_or(0, Vec::len),
        "materialized column"
    );

    Ok(CdbColumn {
        name: raw.name,
        index,
        data_type,
        rows,
    })
}

fn missing_child(parent: &'static str, child: &'static str) -> CdbError {
    CdbError::MissingChild { parent, child }
}

fn build_database(conn: &Connection, tables: &[CdbTable]) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .wrap_err("failed to begin build transaction")?;

    let structure_ddl = format!(
        r#"CREATE TABLE {} ("name" '{}', "id" '{}')"#,
        quote_ident(STRUCTURE_TABLE),
        meta::annotation("TEXT", meta::STRUCTURE_SENTINEL),
        meta::annotation("INTEGER", meta::STRUCTURE_SENTINEL),
    );
    tx.execute(&structure_ddl, [])?;

    for table in tables {
        create_table(&tx, table)?;
        insert_rows(&tx, table)?;
        tx.execute(
            &format!(
                "INSERT INTO {} VALUES (?1, ?2)",
                quote_ident(STRUCTURE_TABLE)
            ),
            params![table.name, table.id as i64],
        )?;
    }

    tx.commit().wrap_err("failed to commit build transaction")
}

fn create_table(conn: &Connection, table: &CdbTable) -> Result<()> {
    ensure!(
        !table.columns.is_empty(),
        "table {:?} has no columns",
        table.name
    );

    let mut ddl = format!("CREATE TABLE {} (", quote_ident(&table.name));
    for (i, column) in table.columns.iter().enumerate() {
        ensure!(
            column.index <= 0xFF,
            "column {:?}.{:?} index {} exceeds the packed range",
            table.name,
            column.name,
            column.index
        );
        if i > 0 {
            ddl.push_str(", ");
        }
        let n = meta::pack(table.id, column.index, column.data_type as u32);
        ddl.push_str(&format!(
            "{} '{}'",
            quote_ident(&column.name),
            meta::annotation(column.data_type.sql_base(), n)
        ));
    }
    ddl.push(')');

    conn.execute(&ddl, [])
        .wrap_err_with(|| format!("creating table {:?}", table.name))?;
    Ok(())
}

fn insert_rows(conn: &Connection, table: &CdbTable) -> Result<()> {
    let column_count = table.columns.len();
    let row_count = table.row_count as usize;
    if row_count == 0 {
        return Ok(());
    }

    let batch = (MAX_BOUND_PARAMS / column_count).max(1);
    let row_tuple = format!("({})", vec!["?"; column_count].join(","));

    let mut row = 0;
    while row < row_count {
        let take = batch.min(row_count - row);
        let sql = format!(
            "INSERT INTO {} VALUES {}",
            quote_ident(&table.name),
            vec![row_tuple.as_str(); take].join(",")
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let cells = (row..row + take)
            .flat_map(|r| table.columns.iter().map(move |c| &c.rows[r]));
        stmt.execute(params_from_iter(cells))
            .wrap_err_with(|| format!("inserting into {:?}", table.name))?;
        row += take;
    }

    Ok(())
}

/// Quotes a SQL identifier, doubling any embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("od\"d"), "\"od\"\"d\"");
    }

    #[test]
    fn batch_sizing_respects_the_parameter_ceiling() {
        // 3 columns -> 333 rows per statement, 999 parameters.
        assert_eq!(MAX_BOUND_PARAMS / 3, 333);
        // Wider than the ceiling still moves one row at a time.
        assert_eq!((MAX_BOUND_PARAMS / 1200).max(1), 1);
    }
}
