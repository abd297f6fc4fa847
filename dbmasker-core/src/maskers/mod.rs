//! Value maskers: synthetic replacements keyed by semantic type.
//!
//! Each masker claims a set of semantic type names and generates a
//! replacement value from the column's [`ColumnMaskSpec`]. The
//! [`MaskerRegistry`] resolves a type name to the first masker claiming it
//! and falls back to [`DefaultMasker`] for unknown names.
//!
//! Built-in maskers never look at the content of the value they replace.

mod date;
mod internet;
mod location;
mod number;
mod password;
mod pattern;
mod person;
mod regexify;
mod registry;
mod text;

use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::models::SqlValue;

pub use date::DateMasker;
pub use internet::{CompanyMasker, CreditCardMasker, IpAddressMasker, UuidMasker};
pub use location::{AddressMasker, LocationMasker};
pub use number::NumberMasker;
pub use password::PasswordMasker;
pub use pattern::{PatternMasker, bothify, lexify, numerify};
pub use person::{EmailMasker, NameMasker, PhoneMasker};
pub use regexify::regexify;
pub use registry::MaskerRegistry;
pub use text::{DefaultMasker, TextMasker, synthetic_text};

/// A generator of synthetic values for one or more semantic types.
pub trait ValueMasker: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns true when this masker handles the semantic type.
    fn supports(&self, semantic_type: &str) -> bool;

    /// Produces a replacement for `original` according to `spec`.
    ///
    /// # Errors
    /// Returns a masking error when the parameters are unusable.
    fn generate(&self, original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue>;
}

impl std::fmt::Debug for dyn ValueMasker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueMasker({})", self.name())
    }
}
