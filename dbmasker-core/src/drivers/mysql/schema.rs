//! MySQL catalog queries.

use crate::Result;
use crate::drivers::{Dialect, filter_excluded};
use crate::error::DbMaskerError;
use crate::models::ColumnInfo;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row};

/// Reads a text column that MySQL 8 may report as binary.
fn lossy_text(row: &MySqlRow, index: usize) -> std::result::Result<String, sqlx::Error> {
    let bytes: Vec<u8> = row.try_get(index)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Base tables in server order, then views.
///
/// A view can only be created once the tables it selects from exist.
pub(crate) fn base_tables_first(entries: Vec<(String, String)>) -> Vec<String> {
    let (views, tables): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|(_, kind)| kind.eq_ignore_ascii_case("VIEW"));
    tables
        .into_iter()
        .chain(views)
        .map(|(name, _)| name)
        .collect()
}

/// `SHOW FULL TABLES`, base tables before views.
pub async fn list_tables(pool: &MySqlPool, exclude: &[String]) -> Result<Vec<String>> {
    let rows = sqlx::query("SHOW FULL TABLES")
        .fetch_all(pool)
        .await
        .map_err(|e| DbMaskerError::query_failed("Failed to list MySQL tables", e))?;

    let entries = rows
        .iter()
        .map(|row| Ok((lossy_text(row, 0)?, lossy_text(row, 1)?)))
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
        .map_err(|e| DbMaskerError::query_failed("Failed to decode table name", e))?;

    Ok(filter_excluded(base_tables_first(entries), exclude))
}

/// Returns true when the name refers to a view in the current database.
pub async fn is_view(pool: &MySqlPool, table: &str) -> Result<bool> {
    let kind: Option<String> = sqlx::query_scalar(
        "SELECT CAST(TABLE_TYPE AS CHAR) FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
    )
    .bind(table)
    .fetch_optional(pool)
    .await
    .map_err(|e| DbMaskerError::driver(table, "Failed to read table type", e))?;

    Ok(kind.is_some_and(|k| k.eq_ignore_ascii_case("VIEW")))
}

/// Builds the DDL block from a `SHOW CREATE TABLE` result.
///
/// Views report `Create View` instead of `Create Table` and are dropped as
/// views.
pub(crate) fn definition_block(table: &str, create: &str, is_view: bool) -> String {
    let drop = if is_view {
        format!(
            "DROP VIEW IF EXISTS {};",
            Dialect::MySql.quote_identifier(table)
        )
    } else {
        Dialect::MySql.drop_table(table)
    };
    format!("{}\n{};", drop, create.trim_end().trim_end_matches(';'))
}

/// Drop statement plus `SHOW CREATE TABLE` output.
pub async fn table_definition(pool: &MySqlPool, table: &str) -> Result<String> {
    let query = format!(
        "SHOW CREATE TABLE {}",
        Dialect::MySql.quote_identifier(table)
    );
    let row = sqlx::query(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| DbMaskerError::driver(table, "Failed to read table definition", e))?;

    let is_view = row
        .columns()
        .get(1)
        .is_some_and(|c| c.name().eq_ignore_ascii_case("Create View"));
    let create = lossy_text(&row, 1)
        .map_err(|e| DbMaskerError::driver(table, "Failed to decode table definition", e))?;

    Ok(definition_block(table, &create, is_view))
}

/// Columns from `INFORMATION_SCHEMA.COLUMNS` in ordinal order.
pub async fn columns(pool: &MySqlPool, table: &str) -> Result<Vec<ColumnInfo>> {
    // Cast to CHAR to avoid VARBINARY type issues in MySQL 8.0+
    let rows = sqlx::query(
        r#"
        SELECT
            CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME,
            CAST(DATA_TYPE AS CHAR) AS DATA_TYPE
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE()
        AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
        "#,
    )
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
                .try_get("COLUMN_NAME")
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode column name", e))?;
            let data_type: String = row
                .try_get("DATA_TYPE")
                .map_err(|e| DbMaskerError::driver(table, "Failed to decode column type", e))?;
            Ok(ColumnInfo::new(name, data_type))
        })
        .collect()
}
