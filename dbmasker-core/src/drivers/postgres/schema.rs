//! PostgreSQL catalog queries and DDL extraction.

use crate::Result;
use crate::drivers::{Dialect, filter_excluded};
use crate::error::DbMaskerError;
use crate::models::ColumnInfo;
use sqlx::{PgPool, Row};

/// One row of `information_schema.columns` used to rebuild DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// `data_type`, such as `integer` or `ARRAY`
    pub data_type: String,
    /// Underlying type name, `_text` for `text[]`
    pub udt_name: String,
    /// Length limit of character types
    pub character_maximum_length: Option<i32>,
    /// Whether the column accepts NULL
    pub is_nullable: bool,
    /// Default expression as PostgreSQL prints it
    pub column_default: Option<String>,
}

impl ColumnDefinition {
    /// Type as written in a `CREATE TABLE` statement.
    pub fn sql_type(&self) -> String {
        match (self.data_type.as_str(), self.character_maximum_length) {
            ("character varying", Some(len)) => format!("varchar({})", len),
            ("character", Some(len)) => format!("char({})", len),
            ("USER-DEFINED", _) => Dialect::Postgres.quote_identifier(&self.udt_name),
            ("ARRAY", _) => {
                let element = self.udt_name.strip_prefix('_').unwrap_or(&self.udt_name);
                format!("{}[]", element)
            }
            (other, _) => other.to_string(),
        }
    }
}

/// Sequence named by a `nextval('<name>'::regclass)` default, as written
/// inside the literal.
pub fn default_sequence(default: &str) -> Option<String> {
    let rest = default.strip_prefix("nextval('")?;
    let (name, _) = rest.split_once("'::regclass)")?;
    Some(name.replace("''", "'"))
}

/// Rebuilds a `CREATE TABLE` statement from column metadata.
///
/// Sequences behind `nextval` defaults are created before the table and
/// owned by their column after it. The result carries no constraints or
/// indexes.
pub fn reconstruct_create_table(table: &str, columns: &[ColumnDefinition]) -> String {
    let quoted_table = Dialect::Postgres.quote_identifier(table);
    let sequences: Vec<(String, &ColumnDefinition)> = columns
        .iter()
        .filter_map(|c| {
            let sequence = default_sequence(c.column_default.as_deref()?)?;
            Some((sequence, c))
        })
        .collect();

    let definitions = columns
        .iter()
        .map(|c| {
            let mut line = format!(
                "  {} {}",
                Dialect::Postgres.quote_identifier(&c.name),
                c.sql_type()
            );
            if !c.is_nullable {
                line.push_str(" NOT NULL");
            }
            if let Some(default) = &c.column_default {
                line.push_str(" DEFAULT ");
                line.push_str(default);
            }
            line
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let mut statements: Vec<String> = sequences
        .iter()
        .map(|(sequence, _)| format!("CREATE SEQUENCE IF NOT EXISTS {};", sequence))
        .collect();
    statements.push(format!("CREATE TABLE {} (\n{}\n);", quoted_table, definitions));
    statements.extend(sequences.iter().map(|(sequence, c)| {
        format!(
            "ALTER SEQUENCE {} OWNED BY {}.{};",
            sequence,
            quoted_table,
            Dialect::Postgres.quote_identifier(&c.name)
        )
    }));
    statements.join("\n")
}

/// Base tables of the schema, sorted by name.
pub async fn list_tables(pool: &PgPool, schema: &str, exclude: &[String]) -> Result<Vec<String>> {
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT tablename::text FROM pg_catalog.pg_tables WHERE schemaname = $1 ORDER BY tablename",
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|e| DbMaskerError::query_failed("Failed to list PostgreSQL tables", e))?;

    Ok(filter_excluded(tables, exclude))
}

/// Drop statement plus `pg_get_tabledef` output, or the reconstructed DDL
/// when that function is unavailable.
pub async fn table_definition(pool: &PgPool, schema: &str, table: &str) -> Result<String> {
    let create = match native_definition(pool, schema, table).await {
        Ok(Some(definition)) => definition.trim_end().trim_end_matches(';').to_string() + ";",
        Ok(None) | Err(_) => {
            tracing::debug!(
                "pg_get_tabledef unavailable for '{}', reconstructing DDL from information_schema",
                table
            );
            let columns = column_definitions(pool, schema, table).await?;
            reconstruct_create_table(table, &columns)
        }
    };

    Ok(format!("{}\n{}", Dialect::Postgres.drop_table(table), create))
}

async fn native_definition(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> std::result::Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT pg_get_tabledef(format('%I.%I', $1::text, $2::text)::regclass::oid)::text")
        .bind(schema)
        .bind(table)
        .fetch_one(pool)
        .await
}

/// Full column metadata for DDL reconstruction.
pub async fn column_definitions(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnDefinition>> {
    let rows = sqlx::query(
        r#"
        SELECT
            column_name::text AS column_name,
            data_type::text AS data_type,
            udt_name::text AS udt_name,
            character_maximum_length::int4 AS character_maximum_length,
            is_nullable::text AS is_nullable,
            column_default::text AS column_default
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| DbMaskerError::driver(table, "Failed to read column definitions", e))?;

    if rows.is_empty() {
        return Err(DbMaskerError::driver_message(
            table,
            format!("table not found in schema '{}'", schema),
        ));
    }

    rows.iter()
        .map(|row| {
            let decode =
                |e: sqlx::Error| DbMaskerError::driver(table, "Failed to decode column definition", e);
            let is_nullable: String = row.try_get("is_nullable").map_err(decode)?;
            Ok(ColumnDefinition {
                name: row.try_get("column_name").map_err(decode)?,
                data_type: row.try_get("data_type").map_err(decode)?,
                udt_name: row.try_get("udt_name").map_err(decode)?,
                character_maximum_length: row
                    .try_get("character_maximum_length")
                    .map_err(decode)?,
                is_nullable: is_nullable == "YES",
                column_default: row.try_get("column_default").map_err(decode)?,
            })
        })
        .collect()
}

/// Columns in ordinal order.
pub async fn columns(pool: &PgPool, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
    Ok(column_definitions(pool, schema, table)
        .await?
        .into_iter()
        .map(|c| ColumnInfo::new(c.name, c.data_type))
        .collect())
}
