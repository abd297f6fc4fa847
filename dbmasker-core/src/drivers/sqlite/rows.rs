//! SQLite row paging.
//!
//! SQLite is dynamically typed, so each column is fetched together with its
//! per-value `typeof()`. Blobs travel as hex text and reals as `f64`, since
//! `CAST(.. AS TEXT)` keeps only 15 significant digits. Everything else
//! travels as text.

use crate::Result;
use crate::drivers::Dialect;
use crate::error::DbMaskerError;
use crate::models::{ColumnInfo, Row, SqlValue};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row as _, SqlitePool};

/// Number of rows in a table.
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<u64> {
    let query = format!(
        "SELECT COUNT(*) FROM {}",
        Dialect::Sqlite.quote_identifier(table)
    );
    let count: i64 = sqlx::query_scalar(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| DbMaskerError::driver(table, "Failed to count rows", e))?;

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Result columns fetched per table column.
const FIELDS_PER_COLUMN: usize = 3;

/// SELECT list of `typeof(col)`, the column's text form and, for reals, the
/// raw value.
pub(crate) fn select_list(columns: &[ColumnInfo]) -> String {
    columns
        .iter()
        .map(|c| {
            let ident = Dialect::Sqlite.quote_identifier(&c.name);
            format!(
                "typeof({ident}), \
                 CASE WHEN typeof({ident}) = 'blob' THEN hex({ident}) ELSE CAST({ident} AS TEXT) END, \
                 CASE WHEN typeof({ident}) = 'real' THEN {ident} END"
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Converts a storage class and its fetched forms into a value.
pub(crate) fn decode_value(
    storage_class: &str,
    text: Option<String>,
    real: Option<f64>,
) -> Option<SqlValue> {
    let Some(text) = text else {
        return Some(SqlValue::Null);
    };

    match storage_class {
        "null" => Some(SqlValue::Null),
        "integer" => Some(SqlValue::Numeric(text)),
        "real" => Some(real.map_or(SqlValue::Numeric(text), SqlValue::Float)),
        "blob" => hex::decode(&text).ok().map(SqlValue::Bytes),
        _ => Some(SqlValue::Text(text)),
    }
}

/// Fetches one page of rows without imposing an order.
pub async fn fetch_rows(
    pool: &SqlitePool,
    table: &str,
    columns: &[ColumnInfo],
    offset: u64,
    limit: usize,
) -> Result<Vec<Row>> {
    let query = format!(
        "SELECT {} FROM {} LIMIT ? OFFSET ?",
        select_list(columns),
        Dialect::Sqlite.quote_identifier(table)
    );

    let rows = sqlx::query(&query)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await
        .map_err(|e| {
            DbMaskerError::driver(table, format!("Failed to fetch rows at offset {}", offset), e)
        })?;

    rows.iter()
        .map(|row| decode_row(row, table, columns.len()))
        .collect()
}

fn decode_row(row: &SqliteRow, table: &str, width: usize) -> Result<Row> {
    (0..width)
        .map(|i| {
            let base = FIELDS_PER_COLUMN * i;
            let storage_class: String = row
                .try_get(base)
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode storage class", e))?;
            let text: Option<String> = row
                .try_get(base + 1)
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode value", e))?;
            let real: Option<f64> = row
                .try_get(base + 2)
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode real value", e))?;
            decode_value(&storage_class, text, real).ok_or_else(|| {
                DbMaskerError::driver_message(table, "blob value is not valid hexadecimal")
            })
        })
        .collect()
}
