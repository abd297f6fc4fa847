//! Placeholder-driven string generation.
//!
//! - `#` becomes a random digit
//! - `?` becomes a random lowercase letter
//! - `*` becomes either (bothify only)
//!
//! Every other character is copied as is.

use super::ValueMasker;
use super::regexify::regexify;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::models::SqlValue;
use rand::Rng;

const DEFAULT_REGEX: &str = r"[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,4}";

pub(crate) fn random_digit() -> char {
    char::from(b'0' + rand::rng().random_range(0..10u8))
}

pub(crate) fn random_letter() -> char {
    char::from(b'a' + rand::rng().random_range(0..26u8))
}

/// Replaces every `#` with a random digit.
pub fn numerify(format: &str) -> String {
    format
        .chars()
        .map(|c| if c == '#' { random_digit() } else { c })
        .collect()
}

/// Replaces every `?` with a random letter.
pub fn lexify(format: &str) -> String {
    format
        .chars()
        .map(|c| if c == '?' { random_letter() } else { c })
        .collect()
}

/// Replaces `#` with digits, `?` with letters and `*` with either.
pub fn bothify(format: &str) -> String {
    format
        .chars()
        .map(|c| match c {
            '#' => random_digit(),
            '?' => random_letter(),
            '*' if rand::rng().random_bool(0.5) => random_digit(),
            '*' => random_letter(),
            other => other,
        })
        .collect()
}

/// `numerify`, `lexify`, `bothify` (parameter `format`) and `regexify`
/// (parameter `regex`, or `pattern`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternMasker;

impl ValueMasker for PatternMasker {
    fn name(&self) -> &str {
        "pattern"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        matches!(semantic_type, "numerify" | "lexify" | "bothify" | "regexify")
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let format = spec.param_str("format");
        let value = match spec.semantic_type.as_str() {
            "lexify" => lexify(format.unwrap_or("????")),
            "bothify" => bothify(format.unwrap_or("##??")),
            "regexify" => {
                let pattern = spec
                    .param_str("regex")
                    .or_else(|| spec.param_str("pattern"))
                    .unwrap_or(DEFAULT_REGEX);
                regexify(pattern)?
            }
            _ => numerify(format.unwrap_or("###")),
        };

        Ok(SqlValue::Text(value))
    }
}
