//! Core masking engine for dbmasker.
//!
//! This crate reads tables from MySQL, PostgreSQL and SQLite databases,
//! substitutes synthetic values for configured columns, and writes a
//! self-contained SQL dump that can be replayed with the engine's own
//! command-line client.
//!
//! # Security Guarantees
//! - Original values of masked columns never reach the dump file
//! - Source databases are only read during a dump
//! - Connection credentials are redacted in logs, errors and `Debug` output
//! - Restore passwords travel through the client's environment, never argv
//!
//! # Architecture
//! - [`maskers`]: semantic type name to synthetic value generator registry
//! - [`drivers`]: one [`DialectDriver`] per engine, behind cargo features
//! - [`orchestrator`]: connection, table and batch pipeline into dump files

pub mod config;
pub mod drivers;
pub mod dump;
pub mod error;
pub mod logging;
pub mod maskers;
pub mod models;
pub mod orchestrator;

// Re-export commonly used types
pub use config::{
    ColumnMaskSpec, ConnectionDescriptor, ConnectionMaskConfig, DatabaseTarget, MaskerConfig,
    TableMaskConfig,
};
pub use drivers::{Dialect, DialectDriver, connect};
pub use error::{DbMaskerError, Result};
pub use logging::init_logging;
pub use maskers::{MaskerRegistry, ValueMasker};
pub use models::{ColumnInfo, DriverKind, OperationResult, OperationStatus, Row, SqlValue};
pub use orchestrator::MaskingOrchestrator;
