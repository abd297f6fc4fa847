//! Masker lookup by semantic type.

use super::{
    AddressMasker, CompanyMasker, CreditCardMasker, DateMasker, DefaultMasker, EmailMasker,
    IpAddressMasker, LocationMasker, NameMasker, NumberMasker, PasswordMasker, PatternMasker,
    PhoneMasker, TextMasker, UuidMasker, ValueMasker,
};
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::models::SqlValue;
use std::sync::Arc;

/// Regeneration attempts when a masker happens to reproduce the original.
const MAX_ATTEMPTS: usize = 8;

/// Ordered collection of maskers with a catch-all fallback.
///
/// # Example
/// ```rust
/// use dbmasker_core::config::ColumnMaskSpec;
/// use dbmasker_core::maskers::MaskerRegistry;
/// use dbmasker_core::models::SqlValue;
///
/// let registry = MaskerRegistry::new();
/// let masked = registry
///     .mask(&SqlValue::from("john@example.com"), &ColumnMaskSpec::new("email"))
///     .unwrap();
/// assert_ne!(masked, SqlValue::from("john@example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct MaskerRegistry {
    maskers: Vec<Arc<dyn ValueMasker>>,
    fallback: Arc<dyn ValueMasker>,
}

impl Default for MaskerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskerRegistry {
    /// Creates a registry holding every built-in masker.
    pub fn new() -> Self {
        let maskers: Vec<Arc<dyn ValueMasker>> = vec![
            Arc::new(EmailMasker),
            Arc::new(NameMasker),
            Arc::new(PhoneMasker),
            Arc::new(AddressMasker),
            Arc::new(LocationMasker),
            Arc::new(TextMasker),
            Arc::new(NumberMasker),
            Arc::new(DateMasker),
            Arc::new(PatternMasker),
            Arc::new(CreditCardMasker),
            Arc::new(CompanyMasker),
            Arc::new(IpAddressMasker),
            Arc::new(UuidMasker),
            Arc::new(PasswordMasker::default()),
        ];

        Self {
            maskers,
            fallback: Arc::new(DefaultMasker),
        }
    }

    /// Creates a registry with no built-ins, only the fallback.
    pub fn empty() -> Self {
        Self {
            maskers: Vec::new(),
            fallback: Arc::new(DefaultMasker),
        }
    }

    /// Adds a masker ahead of every existing one.
    pub fn register(&mut self, masker: Arc<dyn ValueMasker>) {
        tracing::debug!("Registering masker '{}'", masker.name());
        self.maskers.insert(0, masker);
    }

    /// Builder form of [`MaskerRegistry::register`].
    pub fn with_masker(mut self, masker: Arc<dyn ValueMasker>) -> Self {
        self.register(masker);
        self
    }

    /// Number of registered maskers, excluding the fallback.
    pub fn len(&self) -> usize {
        self.maskers.len()
    }

    /// Returns true when only the fallback is available.
    pub fn is_empty(&self) -> bool {
        self.maskers.is_empty()
    }

    /// First masker supporting the type, or the fallback.
    pub fn resolve(&self, semantic_type: &str) -> &dyn ValueMasker {
        let masker = self
            .maskers
            .iter()
            .find(|masker| masker.supports(semantic_type))
            .unwrap_or(&self.fallback);
        &**masker
    }

    /// Masks one value. NULL stays NULL.
    ///
    /// A generated value equal to the original is regenerated a bounded
    /// number of times; degenerate specs such as `min == max` can still
    /// reproduce it.
    ///
    /// # Errors
    /// Propagates masking errors from the resolved masker.
    pub fn mask(&self, original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        if original.is_null() {
            return Ok(SqlValue::Null);
        }

        let masker = self.resolve(&spec.semantic_type);
        let mut generated = masker.generate(original, spec)?;
        for _ in 1..MAX_ATTEMPTS {
            if !same_content(original, &generated) {
                break;
            }
            generated = masker.generate(original, spec)?;
        }

        Ok(generated)
    }
}

/// Compares two values by their rendered content, so `Int(5)` matches `Numeric("5")`.
fn same_content(a: &SqlValue, b: &SqlValue) -> bool {
    fn render(value: &SqlValue) -> Option<String> {
        match value {
            SqlValue::Null => None,
            SqlValue::Bool(b) => Some(u8::from(*b).to_string()),
            SqlValue::Int(i) => Some(i.to_string()),
            SqlValue::Float(f) => Some(f.to_string()),
            SqlValue::Numeric(s) | SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    let rendered = render(a);
    a == b || (rendered.is_some() && rendered == render(b))
}
