//! MySQL row paging.
//!
//! Every column is selected as text: binary and spatial columns through
//! `HEX()`, `BIT` through its unsigned value, the rest through
//! `CAST(.. AS CHAR)`.

use crate::Result;
use crate::drivers::{Dialect, FetchKind};
use crate::error::DbMaskerError;
use crate::models::{ColumnInfo, Row};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row as _};

/// Classifies a MySQL `DATA_TYPE`.
pub(crate) fn fetch_kind(data_type: &str) -> FetchKind {
    match data_type {
        "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" | "geometry"
        | "point" | "linestring" | "polygon" | "multipoint" | "multilinestring"
        | "multipolygon" | "geometrycollection" | "geomcollection" => FetchKind::Bytes,
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "decimal"
        | "numeric" | "float" | "double" | "real" | "year" | "bit" => FetchKind::Numeric,
        _ => FetchKind::Text,
    }
}

/// SELECT expression producing the text form of a column.
pub(crate) fn select_expression(column: &ColumnInfo) -> String {
    let ident = Dialect::MySql.quote_identifier(&column.name);
    match (column.data_type.as_str(), fetch_kind(&column.data_type)) {
        ("bit", _) => format!("CAST(CAST({} AS UNSIGNED) AS CHAR)", ident),
        (_, FetchKind::Bytes) => format!("HEX({})", ident),
        _ => format!("CAST({} AS CHAR)", ident),
    }
}

/// Number of rows in a table. Views report zero: their rows belong to the
/// tables they select from.
pub async fn count_rows(pool: &MySqlPool, table: &str) -> Result<u64> {
    if super::schema::is_view(pool, table).await? {
        tracing::debug!("Skipping rows of view '{}'", table);
        return Ok(0);
    }

    let query = format!(
        "SELECT COUNT(*) FROM {}",
        Dialect::MySql.quote_identifier(table)
    );
    let count: i64 = sqlx::query_scalar(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| DbMaskerError::driver(table, "Failed to count rows", e))?;

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Fetches one page of rows without imposing an order.
pub async fn fetch_rows(
    pool: &MySqlPool,
    table: &str,
    columns: &[ColumnInfo],
    offset: u64,
    limit: usize,
) -> Result<Vec<Row>> {
    let select_list = columns
        .iter()
        .map(select_expression)
        .collect::<Vec<_>>()
        .join(", ");
    let query = format!(
        "SELECT {} FROM {} LIMIT ? OFFSET ?",
        select_list,
        Dialect::MySql.quote_identifier(table)
    );

    let rows = sqlx::query(&query)
        .bind(u64::try_from(limit).unwrap_or(u64::MAX))
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            DbMaskerError::driver(table, format!("Failed to fetch rows at offset {}", offset), e)
        })?;

    let kinds: Vec<FetchKind> = columns.iter().map(|c| fetch_kind(&c.data_type)).collect();
    rows.iter().map(|row| decode_row(row, table, &kinds)).collect()
}

fn decode_row(row: &MySqlRow, table: &str, kinds: &[FetchKind]) -> Result<Row> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let bytes: Option<Vec<u8>> = row
                .try_get(i)
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode value", e))?;
            let text = bytes.map(|b| String::from_utf8_lossy(&b).into_owned());
            kind.decode(text).ok_or_else(|| {
                DbMaskerError::driver_message(table, format!("malformed value in column {}", i + 1))
            })
        })
        .collect()
}
