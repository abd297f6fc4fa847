//! Database target configuration.
//!
//! A `DatabaseTarget` is what the configuration file declares; a
//! `ConnectionDescriptor` is the resolved, named form handed to the drivers.

use crate::error::redact_database_url;
use crate::models::DriverKind;
use serde::{Deserialize, Serialize};

/// A database target as declared in configuration.
///
/// # Security
/// The URL may contain a password. It is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseTarget {
    /// Explicit engine name; detected from the URL when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverKind>,
    /// Connection URL or SQLite file path
    pub url: String,
    /// Namespace to dump (PostgreSQL only, defaults to `public`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl std::fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseTarget")
            .field("driver", &self.driver)
            .field("url", &redact_database_url(&self.url))
            .field("schema", &self.schema)
            .finish()
    }
}

impl DatabaseTarget {
    /// Creates a target whose engine is detected from the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            driver: None,
            url: url.into(),
            schema: None,
        }
    }

    /// Builder method to force the engine kind.
    pub fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Builder method to set the PostgreSQL schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Effective engine kind of this target.
    pub fn kind(&self) -> DriverKind {
        self.driver
            .clone()
            .unwrap_or_else(|| detect_driver_kind(&self.url))
    }
}

/// A named, resolved connection handed to a dialect driver.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    /// Connection name, unique within a run
    pub name: String,
    /// Engine family
    pub kind: DriverKind,
    /// PostgreSQL schema override
    pub schema: Option<String>,
    url: String,
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("schema", &self.schema)
            .field("url", &redact_database_url(&self.url))
            .finish()
    }
}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.name,
            self.kind,
            redact_database_url(&self.url)
        )
    }
}

impl ConnectionDescriptor {
    /// Creates a descriptor with an explicit engine kind.
    pub fn new(name: impl Into<String>, kind: DriverKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            schema: None,
            url: url.into(),
        }
    }

    /// Resolves a configured target under the given name.
    pub fn from_target(name: impl Into<String>, target: &DatabaseTarget) -> Self {
        Self {
            name: name.into(),
            kind: target.kind(),
            schema: target.schema.clone(),
            url: target.url.clone(),
        }
    }

    /// Builder method to set the PostgreSQL schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// The raw connection URL. Callers must not log it.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The connection URL with any password masked.
    pub fn redacted_url(&self) -> String {
        redact_database_url(&self.url)
    }
}

/// Detects the engine family from a connection URL or file path.
///
/// Unrecognized schemes map to [`DriverKind::Unsupported`] carrying the scheme.
pub fn detect_driver_kind(url: &str) -> DriverKind {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
        DriverKind::Postgres
    } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
        DriverKind::MySql
    } else if lower.starts_with("sqlite:")
        || lower == ":memory:"
        || lower.ends_with(".db")
        || lower.ends_with(".sqlite")
        || lower.ends_with(".sqlite3")
    {
        DriverKind::Sqlite
    } else {
        let scheme = lower.split("://").next().unwrap_or_default();
        DriverKind::Unsupported(scheme.to_string())
    }
}
