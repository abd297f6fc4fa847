//! Synthetic dates and times.
//!
//! Formats use single-letter tokens (`Y-m-d H:i:s`) unless they contain `%`, in
//! which case they are chrono `strftime` strings.

use super::ValueMasker;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::error::DbMaskerError;
use crate::models::SqlValue;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Translates a single-letter date format into a chrono strftime format.
pub(crate) fn letter_format_to_strftime(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        let token = match c {
            'd' => "%d",
            'D' => "%a",
            'j' => "%-d",
            'l' => "%A",
            'N' => "%u",
            'w' => "%w",
            'z' => "%j",
            'W' => "%V",
            'F' => "%B",
            'm' => "%m",
            'M' => "%b",
            'n' => "%-m",
            'Y' => "%Y",
            'y' => "%y",
            'a' => "%P",
            'A' => "%p",
            'g' => "%-I",
            'G' => "%-H",
            'h' => "%I",
            'H' => "%H",
            'i' => "%M",
            's' => "%S",
            'u' => "%6f",
            'v' => "%3f",
            'e' | 'T' => "%Z",
            'O' => "%z",
            'P' => "%:z",
            'U' => "%s",
            'c' => "%Y-%m-%dT%H:%M:%S%:z",
            'r' => "%a, %d %b %Y %H:%M:%S %z",
            '%' => "%%",
            '\\' => {
                match chars.next() {
                    Some('%') => out.push_str("%%"),
                    Some(escaped) => out.push(escaped),
                    None => {}
                }
                continue;
            }
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(token);
    }

    out
}

/// Renders `moment` with a single-letter or strftime format.
///
/// # Errors
/// Returns a masking error when the strftime format is invalid.
pub(crate) fn render(moment: &DateTime<Utc>, format: &str, semantic_type: &str) -> Result<String> {
    let strftime = if format.contains('%') {
        format.to_string()
    } else {
        letter_format_to_strftime(format)
    };

    let items: Vec<Item<'_>> = StrftimeItems::new(&strftime).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(DbMaskerError::masking(
            semantic_type,
            format!("invalid date format '{}'", format),
        ));
    }

    Ok(moment.format_with_items(items.into_iter()).to_string())
}

/// A random instant between the Unix epoch and now.
fn random_moment() -> Result<DateTime<Utc>> {
    let now = Utc::now().timestamp();
    let seconds = rand::rng().random_range(0..=now.max(0));
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| DbMaskerError::masking("date", "timestamp out of range"))
}

/// `date`, `datetime`, `time` with an optional `format`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateMasker;

impl ValueMasker for DateMasker {
    fn name(&self) -> &str {
        "date"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        matches!(semantic_type, "date" | "datetime" | "time")
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let default_format = match spec.semantic_type.as_str() {
            "datetime" => "Y-m-d H:i:s",
            "time" => "H:i:s",
            _ => "Y-m-d",
        };
        let format = spec.param_str("format").unwrap_or(default_format);

        let moment = random_moment()?;
        Ok(SqlValue::Text(render(&moment, format, &spec.semantic_type)?))
    }
}
