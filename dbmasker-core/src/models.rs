//! Data types shared between the drivers, the maskers and the orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Database engine family a connection belongs to.
///
/// Unknown engine names are kept as [`DriverKind::Unsupported`] so that the
/// failure surfaces when the connection is processed, not when configuration
/// is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DriverKind {
    /// MySQL, also accepted as `mariadb`
    MySql,
    /// PostgreSQL, also accepted as `postgresql` or `pgsql`
    Postgres,
    /// SQLite, also accepted as `sqlite3`
    Sqlite,
    /// Any other engine name, kept verbatim
    Unsupported(String),
}

impl DriverKind {
    /// Parses a driver name, accepting the common aliases.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Self::MySql,
            "postgres" | "postgresql" | "pgsql" => Self::Postgres,
            "sqlite" | "sqlite3" => Self::Sqlite,
            _ => Self::Unsupported(name.to_string()),
        }
    }

    /// Canonical configuration name of the engine.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
            Self::Unsupported(name) => name,
        }
    }
}

impl From<String> for DriverKind {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<DriverKind> for String {
    fn from(value: DriverKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MySql => write!(f, "MySQL"),
            Self::Postgres => write!(f, "PostgreSQL"),
            Self::Sqlite => write!(f, "SQLite"),
            Self::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// A single cell value moving between fetch, masking and SQL formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (produced by numeric maskers)
    Int(i64),
    /// Floating point value, as fetched from SQLite REAL cells
    Float(f64),
    /// Exact numeric in its database text form, emitted unquoted
    Numeric(String),
    /// Any textual value, emitted as a quoted string literal
    Text(String),
    /// Raw binary value
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the textual content of a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One fetched row, aligned with the column list it was fetched with.
pub type Row = Vec<SqlValue>;

/// Column metadata from live schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name as stored in the catalog
    pub name: String,
    /// Engine-specific data type name, lower-cased
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates column metadata, normalizing the type name.
    pub fn new(name: impl Into<String>, data_type: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.as_ref().trim().to_ascii_lowercase(),
        }
    }
}

/// Outcome of a dump operation for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// The dump file was written completely
    Success,
    /// The connection failed; see [`OperationResult::error`]
    Error,
}

/// Structured result of dumping one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the dump succeeded
    pub status: OperationStatus,
    /// Connection name
    pub connection: String,
    /// Dump file, on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    /// Tables written, on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables_processed: Option<usize>,
    /// Error message, on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    /// Successful dump of `tables_processed` tables into `output_file`.
    pub fn success(
        connection: impl Into<String>,
        output_file: PathBuf,
        tables_processed: usize,
    ) -> Self {
        Self {
            status: OperationStatus::Success,
            connection: connection.into(),
            output_file: Some(output_file),
            tables_processed: Some(tables_processed),
            error: None,
        }
    }

    /// Failed dump with a human-readable error.
    pub fn failure(connection: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            status: OperationStatus::Error,
            connection: connection.into(),
            output_file: None,
            tables_processed: None,
            error: Some(error.to_string()),
        }
    }

    /// Returns true when the dump succeeded.
    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }
}
