//! SQLite catalog queries.
//!
//! - `sqlite_master`: table names and stored `CREATE TABLE` text
//! - `pragma_table_info()`: column names and declared types

use crate::Result;
use crate::drivers::{Dialect, filter_excluded};
use crate::error::DbMaskerError;
use crate::models::ColumnInfo;
use sqlx::{Row, SqlitePool};

/// User tables in catalog order, internal `sqlite_` tables skipped.
pub async fn list_tables(pool: &SqlitePool, exclude: &[String]) -> Result<Vec<String>> {
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| DbMaskerError::query_failed("Failed to list SQLite tables", e))?;

    Ok(filter_excluded(tables, exclude))
}

/// Drop statement plus the stored `CREATE TABLE` text.
pub async fn table_definition(pool: &SqlitePool, table: &str) -> Result<String> {
    let create: Option<String> =
        sqlx::query_scalar("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(pool)
            .await
            .map_err(|e| DbMaskerError::driver(table, "Failed to read table definition", e))?;

    let create =
        create.ok_or_else(|| DbMaskerError::driver_message(table, "table not found in sqlite_master"))?;

    Ok(format!(
        "{}\n{};",
        Dialect::Sqlite.drop_table(table),
        create.trim_end().trim_end_matches(';')
    ))
}

/// Columns in declaration order.
pub async fn columns(pool: &SqlitePool, table: &str) -> Result<Vec<ColumnInfo>> {
    let rows = sqlx::query("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| DbMaskerError::driver(table, "Failed to read columns", e))?;

    if rows.is_empty() {
        return Err(DbMaskerError::driver_message(table, "table has no columns"));
    }

    rows.iter()
        .map(|row| {
            let name: String = row
                .try_get("name")
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode column name", e))?;
            let data_type: String = row.try_get("type").unwrap_or_default();
            Ok(ColumnInfo::new(name, data_type))
        })
        .collect()
}
