//! Free text and catch-all maskers.

use super::ValueMasker;
use super::pattern::random_letter;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::models::SqlValue;
use fake::Fake;
use fake::faker::lorem::en::{Sentence, Word};

const DEFAULT_TEXT_LENGTH: usize = 100;
const FALLBACK_TEXT_LENGTH: usize = 50;

/// Generates lorem text of at most `max_chars` characters.
///
/// Whole sentences are used while they fit, then whole words, then letters.
pub fn synthetic_text(max_chars: usize) -> String {
    let text = fill(max_chars, || Sentence(3..8).fake());
    if !text.is_empty() || max_chars == 0 {
        return text;
    }

    let text = fill(max_chars, || Word().fake());
    if !text.is_empty() {
        return text;
    }

    (0..max_chars).map(|_| random_letter()).collect()
}

/// Joins generated pieces with spaces until the next one would not fit.
fn fill(max_chars: usize, mut piece: impl FnMut() -> String) -> String {
    let mut text = String::new();
    let mut used = 0;

    loop {
        let next = piece();
        let separator = usize::from(!text.is_empty());
        let next_len = next.chars().count();
        if next_len == 0 || used + separator + next_len > max_chars {
            break;
        }
        if separator == 1 {
            text.push(' ');
        }
        text.push_str(&next);
        used += separator + next_len;
    }

    text
}

/// `text`: prose bounded by the `length` parameter (default 100).
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMasker;

impl ValueMasker for TextMasker {
    fn name(&self) -> &str {
        "text"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        semantic_type == "text"
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let length = spec.param_usize("length").unwrap_or(DEFAULT_TEXT_LENGTH);
        Ok(SqlValue::Text(synthetic_text(length)))
    }
}

/// Fallback for unknown semantic types: prose of at most 50 characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMasker;

impl ValueMasker for DefaultMasker {
    fn name(&self) -> &str {
        "default"
    }

    fn supports(&self, _semantic_type: &str) -> bool {
        true
    }

    fn generate(&self, _original: &SqlValue, _spec: &ColumnMaskSpec) -> Result<SqlValue> {
        Ok(SqlValue::Text(synthetic_text(FALLBACK_TEXT_LENGTH)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_text_respects_bound() {
        for max in [0, 1, 3, 10, 25, 50, 100, 400] {
            for _ in 0..20 {
                let text = synthetic_text(max);
                assert!(
                    text.chars().count() <= max,
                    "'{}' is longer than {}",
                    text,
                    max
                );
                if max > 0 {
                    assert!(!text.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_text_masker_uses_length() {
        let spec = ColumnMaskSpec::new("text").with_param("length", 30);
        let value = TextMasker.generate(&SqlValue::from("secret"), &spec).unwrap();
        let text = value.as_text().unwrap();
        assert!(text.chars().count() <= 30);
    }

    #[test]
    fn test_default_masker_supports_everything() {
        assert!(DefaultMasker.supports("anything"));
        assert!(DefaultMasker.supports(""));
        let value = DefaultMasker
            .generate(&SqlValue::from("x"), &ColumnMaskSpec::new("mystery"))
            .unwrap();
        assert!(value.as_text().unwrap().chars().count() <= 50);
    }
}
