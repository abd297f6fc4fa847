//! PostgreSQL row paging through `::text` casts.

use crate::Result;
use crate::drivers::{Dialect, FetchKind};
use crate::error::DbMaskerError;
use crate::models::{ColumnInfo, Row};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row as _};

/// Classifies an `information_schema` data type.
pub(crate) fn fetch_kind(data_type: &str) -> FetchKind {
    match data_type {
        "bytea" => FetchKind::Bytes,
        "boolean" => FetchKind::Bool,
        "smallint" | "integer" | "bigint" | "numeric" | "decimal" | "real"
        | "double precision" => FetchKind::Numeric,
        _ => FetchKind::Text,
    }
}

/// SELECT expression producing the text form of a column.
pub(crate) fn select_expression(column: &ColumnInfo) -> String {
    let ident = Dialect::Postgres.quote_identifier(&column.name);
    match fetch_kind(&column.data_type) {
        FetchKind::Bytes => format!("encode({}, 'hex')", ident),
        _ => format!("{}::text", ident),
    }
}

fn qualified(schema: &str, table: &str) -> String {
    format!(
        "{}.{}",
        Dialect::Postgres.quote_identifier(schema),
        Dialect::Postgres.quote_identifier(table)
    )
}

/// Number of rows in a table.
pub async fn count_rows(pool: &PgPool, schema: &str, table: &str) -> Result<u64> {
    let query = format!("SELECT COUNT(*) FROM {}", qualified(schema, table));
    let count: i64 = sqlx::query_scalar(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| DbMaskerError::driver(table, "Failed to count rows", e))?;

    Ok(u64::try_from(count).unwrap_or(0))
}

/// Fetches one page of rows without imposing an order.
pub async fn fetch_rows(
    pool: &PgPool,
    schema: &str,
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
        "SELECT {} FROM {} LIMIT $1 OFFSET $2",
        select_list,
        qualified(schema, table)
    );

    let rows = sqlx::query(&query)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await
        .map_err(|e| {
            DbMaskerError::driver(table, format!("Failed to fetch rows at offset {}", offset), e)
        })?;

    let kinds: Vec<FetchKind> = columns.iter().map(|c| fetch_kind(&c.data_type)).collect();
    rows.iter().map(|row| decode_row(row, table, &kinds)).collect()
}

fn decode_row(row: &PgRow, table: &str, kinds: &[FetchKind]) -> Result<Row> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let text: Option<String> = row
                .try_get(i)
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode value", e))?;
            kind.decode(text).ok_or_else(|| {
                DbMaskerError::driver_message(table, format!("malformed value in column {}", i + 1))
            })
        })
        .collect()
}
