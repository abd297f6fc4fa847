//! Per-connection masking rules.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

fn default_semantic_type() -> String {
    "text".to_string()
}

/// How one column is masked: a semantic type plus free-form parameters.
///
/// ```rust
/// use dbmasker_core::config::ColumnMaskSpec;
///
/// let spec: ColumnMaskSpec =
///     serde_json::from_str(r#"{"type": "randomNumber", "min": 10, "max": 20}"#).unwrap();
/// assert_eq!(spec.semantic_type, "randomNumber");
/// assert_eq!(spec.param_i64("min"), Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMaskSpec {
    /// Semantic type name, matched against the registry at mask time
    #[serde(rename = "type", default = "default_semantic_type")]
    pub semantic_type: String,
    /// Masker parameters such as `length`, `min`, `max`, `format`, `regex`
    #[serde(flatten)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl Default for ColumnMaskSpec {
    fn default() -> Self {
        Self::new(default_semantic_type())
    }
}

impl ColumnMaskSpec {
    /// Creates a spec for the given semantic type with no parameters.
    pub fn new(semantic_type: impl Into<String>) -> Self {
        Self {
            semantic_type: semantic_type.into(),
            parameters: serde_json::Map::new(),
        }
    }

    /// Builder method to add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// String parameter, if present and textual.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(serde_json::Value::as_str)
    }

    /// Integer parameter. Numeric strings are accepted.
    pub fn param_i64(&self, key: &str) -> Option<i64> {
        match self.parameters.get(key)? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Non-negative integer parameter.
    pub fn param_usize(&self, key: &str) -> Option<usize> {
        self.param_i64(key).and_then(|v| usize::try_from(v).ok())
    }
}

/// Masking rules for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMaskConfig {
    /// Column name to mask spec; unlisted columns pass through unchanged
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnMaskSpec>,
}

impl TableMaskConfig {
    /// Builder method to mask a column.
    pub fn with_column(mut self, column: impl Into<String>, spec: ColumnMaskSpec) -> Self {
        self.columns.insert(column.into(), spec);
        self
    }

    /// Mask spec for a column, if configured.
    pub fn column(&self, name: &str) -> Option<&ColumnMaskSpec> {
        self.columns.get(name)
    }
}

/// Masking rules and output settings for one connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMaskConfig {
    /// Tables to dump with their masking rules. When non-empty, only these
    /// tables are dumped.
    #[serde(default)]
    pub tables: BTreeMap<String, TableMaskConfig>,
    /// Tables skipped entirely
    #[serde(default)]
    pub exclude_tables: Vec<String>,
    /// Dump file name, relative to the output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

impl ConnectionMaskConfig {
    /// Builder method to add a table's rules.
    pub fn with_table(mut self, table: impl Into<String>, config: TableMaskConfig) -> Self {
        self.tables.insert(table.into(), config);
        self
    }

    /// Builder method to exclude a table.
    pub fn with_excluded(mut self, table: impl Into<String>) -> Self {
        self.exclude_tables.push(table.into());
        self
    }

    /// Builder method to set the dump file name.
    pub fn with_output_file(mut self, file: impl Into<String>) -> Self {
        self.output_file = Some(file.into());
        self
    }

    /// Explicitly configured tables, or `None` when every table is dumped.
    pub fn allow_list(&self) -> Option<Vec<&str>> {
        if self.tables.is_empty() {
            None
        } else {
            Some(self.tables.keys().map(String::as_str).collect())
        }
    }

    /// Excluded table names as a set.
    pub fn exclusions(&self) -> HashSet<&str> {
        self.exclude_tables.iter().map(String::as_str).collect()
    }

    /// Rules for a table, if configured.
    pub fn table(&self, name: &str) -> Option<&TableMaskConfig> {
        self.tables.get(name)
    }

    /// Dump file name for the named connection.
    pub fn output_file_name(&self, connection: &str) -> String {
        self.output_file
            .clone()
            .unwrap_or_else(|| format!("masked_database_{}.sql", connection))
    }
}
