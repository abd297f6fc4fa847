//! SQL text generation shared by every dialect.
//!
//! Literal formatting, identifier quoting, integrity directives and INSERT
//! assembly are pure functions of the [`Dialect`], so they are tested without
//! a database.

use crate::Result;
use crate::config::TableMaskConfig;
use crate::error::DbMaskerError;
use crate::maskers::MaskerRegistry;
use crate::models::{ColumnInfo, Row, SqlValue};

/// SQL flavour of a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL and MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
    /// SQLite 3
    Sqlite,
}

impl Dialect {
    /// Quotes an identifier, doubling embedded quote characters.
    ///
    /// ```rust
    /// use dbmasker_core::drivers::Dialect;
    ///
    /// assert_eq!(Dialect::MySql.quote_identifier("order"), "`order`");
    /// assert_eq!(Dialect::Postgres.quote_identifier("a\"b"), "\"a\"\"b\"");
    /// ```
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", name.replace('`', "``")),
            Self::Postgres | Self::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Quotes a string literal with this dialect's escaping rules.
    pub fn quote_string(self, value: &str) -> String {
        match self {
            Self::MySql => {
                let mut out = String::with_capacity(value.len() + 2);
                out.push('\'');
                for c in value.chars() {
                    match c {
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '"' => out.push_str("\\\""),
                        '\0' => out.push_str("\\0"),
                        other => out.push(other),
                    }
                }
                out.push('\'');
                out
            }
            Self::Postgres | Self::Sqlite => format!("'{}'", value.replace('\'', "''")),
        }
    }

    /// Renders a value as a SQL literal.
    ///
    /// ```rust
    /// use dbmasker_core::drivers::Dialect;
    /// use dbmasker_core::models::SqlValue;
    ///
    /// assert_eq!(Dialect::MySql.format_literal(&SqlValue::Null), "NULL");
    /// assert_eq!(Dialect::MySql.format_literal(&SqlValue::Bool(true)), "1");
    /// assert_eq!(Dialect::MySql.format_literal(&SqlValue::from("a'b")), "'a\\'b'");
    /// ```
    pub fn format_literal(self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => match (self, b) {
                (Self::Postgres, true) => "TRUE".to_string(),
                (Self::Postgres, false) => "FALSE".to_string(),
                (_, b) => u8::from(*b).to_string(),
            },
            SqlValue::Int(i) => i.to_string(),
            // Debug keeps a decimal point and the shortest round-tripping digits
            SqlValue::Float(f) if f.is_finite() => format!("{:?}", f),
            SqlValue::Float(f) if f.is_nan() => self.quote_string("NaN"),
            SqlValue::Float(f) if f.is_sign_positive() => self.quote_string("Infinity"),
            SqlValue::Float(_) => self.quote_string("-Infinity"),
            SqlValue::Numeric(s) if is_numeric_literal(s) => s.clone(),
            SqlValue::Numeric(s) | SqlValue::Text(s) => self.quote_string(s),
            SqlValue::Bytes(bytes) => {
                let hex = hex::encode_upper(bytes);
                match self {
                    Self::Postgres => format!("'\\x{}'", hex),
                    Self::MySql | Self::Sqlite => format!("X'{}'", hex),
                }
            }
        }
    }

    /// Statements written after the banner to suspend integrity checks.
    pub fn integrity_deferral(self) -> &'static str {
        match self {
            Self::MySql => "SET FOREIGN_KEY_CHECKS=0;",
            Self::Postgres => "SET session_replication_role = 'replica';",
            Self::Sqlite => "PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;",
        }
    }

    /// Statements closing the dump and re-enabling integrity checks.
    pub fn integrity_restore(self) -> &'static str {
        match self {
            Self::MySql => "SET FOREIGN_KEY_CHECKS=1;",
            Self::Postgres => "SET session_replication_role = 'origin';",
            Self::Sqlite => "COMMIT;\nPRAGMA foreign_keys=ON;",
        }
    }

    /// `DROP TABLE` statement preceding a table's DDL.
    pub fn drop_table(self, table: &str) -> String {
        match self {
            Self::Postgres => format!(
                "DROP TABLE IF EXISTS {} CASCADE;",
                self.quote_identifier(table)
            ),
            Self::MySql | Self::Sqlite => {
                format!("DROP TABLE IF EXISTS {};", self.quote_identifier(table))
            }
        }
    }
}

/// Returns true for text that is a plain decimal number, with optional sign,
/// fraction and exponent.
pub fn is_numeric_literal(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = all_digits(whole)
        && fraction.is_none_or(all_digits)
        && (!whole.is_empty() || fraction.is_some_and(|f| !f.is_empty()));

    let exponent_ok = exponent.is_none_or(|e| {
        let digits = e.strip_prefix(['-', '+']).unwrap_or(e);
        !digits.is_empty() && all_digits(digits)
    });

    mantissa_ok && exponent_ok
}

/// How a value fetched in text form maps back to a [`SqlValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Quoted string literal
    Text,
    /// Exact number kept in its text form
    Numeric,
    /// Boolean rendered as `t`/`f`, `true`/`false` or `1`/`0`
    Bool,
    /// Binary value fetched as hexadecimal text
    Bytes,
}

impl FetchKind {
    /// Decodes a fetched value; `None` means the text is malformed for this
    /// kind.
    pub fn decode(self, text: Option<String>) -> Option<SqlValue> {
        let Some(text) = text else {
            return Some(SqlValue::Null);
        };

        match self {
            Self::Text => Some(SqlValue::Text(text)),
            Self::Numeric => Some(SqlValue::Numeric(text)),
            Self::Bool => match text.as_str() {
                "t" | "true" | "1" => Some(SqlValue::Bool(true)),
                "f" | "false" | "0" => Some(SqlValue::Bool(false)),
                _ => None,
            },
            Self::Bytes => hex::decode(&text).ok().map(SqlValue::Bytes),
        }
    }
}

/// Builds one multi-row INSERT for a batch, masking configured columns.
///
/// Returns `None` for an empty batch.
///
/// # Errors
/// Returns a driver error if a row does not match the column list, and
/// propagates masking errors.
pub fn build_insert_statement(
    dialect: Dialect,
    table: &str,
    columns: &[ColumnInfo],
    rows: &[Row],
    mask: Option<&TableMaskConfig>,
    registry: &MaskerRegistry,
) -> Result<Option<String>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let column_list = columns
        .iter()
        .map(|c| dialect.quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let specs: Vec<_> = columns
        .iter()
        .map(|c| mask.and_then(|m| m.column(&c.name)))
        .collect();

    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != columns.len() {
            return Err(DbMaskerError::driver_message(
                table,
                format!(
                    "row has {} values but the table has {} columns",
                    row.len(),
                    columns.len()
                ),
            ));
        }

        let mut literals = Vec::with_capacity(row.len());
        for (value, spec) in row.iter().zip(&specs) {
            let literal = match spec {
                Some(spec) => dialect.format_literal(&registry.mask(value, spec)?),
                None => dialect.format_literal(value),
            };
            literals.push(literal);
        }
        tuples.push(format!("({})", literals.join(", ")));
    }

    Ok(Some(format!(
        "INSERT INTO {} ({}) VALUES\n{};",
        dialect.quote_identifier(table),
        column_list,
        tuples.join(",\n")
    )))
}
