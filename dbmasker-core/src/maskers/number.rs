//! Uniform random integers.

use super::ValueMasker;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::error::DbMaskerError;
use crate::models::SqlValue;
use rand::Rng;

/// `number` / `randomNumber`: integer in `[min, max]` (defaults 1 and 1000).
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberMasker;

impl ValueMasker for NumberMasker {
    fn name(&self) -> &str {
        "number"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        matches!(semantic_type, "number" | "randomNumber")
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let min = spec.param_i64("min").unwrap_or(1);
        let max = spec.param_i64("max").unwrap_or(1000);

        if min > max {
            return Err(DbMaskerError::masking(
                &spec.semantic_type,
                format!("min ({}) is greater than max ({})", min, max),
            ));
        }

        Ok(SqlValue::Int(rand::rng().random_range(min..=max)))
    }
}
