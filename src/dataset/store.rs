use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, params, params_from_iter};

use super::column::{Column, ColumnKind};
use super::record::AbsenceRecord;

pub const DB_SCHEMA_VERSION: &str = "1.0.0";

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn column_definitions() -> String {
    Column::ALL
        .into_iter()
        .map(|column| {
            let sql_type = match column.kind() {
                ColumnKind::Integer => "INTEGER",
                ColumnKind::Real => "REAL",
            };
            format!("{} {sql_type} NOT NULL", column.as_str())
        })
        .collect::<Vec<String>>()
        .join(",\n  ")
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS absences (
              row_id INTEGER PRIMARY KEY,
              {}
            );
            ",
            column_definitions()
        ))
        .context("failed to create dataset schema")?;
    Ok(())
}

/// Replaces every stored record and the metadata entries in one transaction.
pub fn replace_records(
    connection: &mut Connection,
    records: &[AbsenceRecord],
    metadata: &BTreeMap<String, String>,
) -> Result<usize> {
    let names = Column::ALL
        .into_iter()
        .map(Column::as_str)
        .collect::<Vec<&str>>();
    let placeholders = (1..=names.len() + 1)
        .map(|index| format!("?{index}"))
        .collect::<Vec<String>>()
        .join(", ");
    let insert_sql = format!(
        "INSERT INTO absences(row_id, {}) VALUES({placeholders})",
        names.join(", ")
    );

    let tx = connection
        .transaction()
        .context("failed to begin dataset transaction")?;
    tx.execute("DELETE FROM absences", [])
        .context("failed to clear existing records")?;

    {
        let mut statement = tx
            .prepare(&insert_sql)
            .context("failed to prepare record insert")?;
        for record in records {
            let mut values = Vec::with_capacity(names.len() + 1);
            values.push(rusqlite::types::Value::Integer(record.row_id));
            for column in Column::ALL {
                let value = record.value(column);
                values.push(match column.kind() {
                    ColumnKind::Integer => rusqlite::types::Value::Integer(value as i64),
                    ColumnKind::Real => rusqlite::types::Value::Real(value),
                });
            }
            statement
                .execute(params_from_iter(values))
                .with_context(|| format!("failed to insert row {}", record.row_id))?;
        }
    }

    for (key, value) in metadata {
        tx.execute(
            "
            INSERT INTO metadata(key, value) VALUES(?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            ",
            params![key, value],
        )
        .with_context(|| format!("failed to write metadata key {key}"))?;
    }

    tx.commit().context("failed to commit dataset transaction")?;
    Ok(records.len())
}

pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))
}

pub fn load_records(connection: &Connection) -> Result<Vec<AbsenceRecord>> {
    let sql = format!(
        "SELECT row_id, {} FROM absences ORDER BY row_id",
        Column::ALL
            .into_iter()
            .map(Column::as_str)
            .collect::<Vec<&str>>()
            .join(", ")
    );
    let mut statement = connection
        .prepare(&sql)
        .context("failed to prepare record query")?;

    let rows = statement.query_map([], |row| {
        let mut record = AbsenceRecord {
            row_id: row.get(0)?,
            ..AbsenceRecord::default()
        };
        for (offset, column) in Column::ALL.into_iter().enumerate() {
            let raw: f64 = row.get(offset + 1)?;
            record.set(column, raw).map_err(|message| {
                rusqlite::Error::FromSqlConversionFailure(
                    offset + 1,
                    rusqlite::types::Type::Real,
                    message.into(),
                )
            })?;
        }
        Ok(record)
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row.context("failed to decode stored record")?);
    }
    Ok(records)
}

pub fn load_metadata(connection: &Connection) -> Result<BTreeMap<String, String>> {
    let mut statement = connection
        .prepare("SELECT key, value FROM metadata ORDER BY key")
        .context("failed to prepare metadata query")?;
    let rows = statement.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut metadata = BTreeMap::new();
    for row in rows {
        let (key, value) = row.context("failed to decode metadata row")?;
        metadata.insert(key, value);
    }
    Ok(metadata)
}

pub fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
