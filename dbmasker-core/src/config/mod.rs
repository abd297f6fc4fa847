//! Configuration types for the masking engine.
//!
//! This module contains all configuration structures consumed by the core:
//! - `ConnectionDescriptor` / `DatabaseTarget`: where a connection points
//! - `ColumnMaskSpec`, `TableMaskConfig`, `ConnectionMaskConfig`: what to mask
//! - `MaskerConfig`: the resolved top-level configuration
//!
//! # Security
//! Connection URLs may carry passwords. They are kept private behind
//! accessors and are redacted in every `Debug` and `Display` output.

mod connection;
mod masker;
mod masking;

pub use connection::{ConnectionDescriptor, DatabaseTarget, detect_driver_kind};
pub use masker::{DEFAULT_BATCH_SIZE, MaskerConfig};
pub use masking::{ColumnMaskSpec, ConnectionMaskConfig, TableMaskConfig};
