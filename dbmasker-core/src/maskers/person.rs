//! Person-identifying fields: email, name, phone.

use super::ValueMasker;
use super::pattern::numerify;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::models::SqlValue;
use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;

/// `email`: an address on a reserved example domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailMasker;

impl ValueMasker for EmailMasker {
    fn name(&self) -> &str {
        "email"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        semantic_type == "email"
    }

    fn generate(&self, _original: &SqlValue, _spec: &ColumnMaskSpec) -> Result<SqlValue> {
        Ok(SqlValue::Text(SafeEmail().fake()))
    }
}

/// `name`, `firstName`, `lastName`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMasker;

impl ValueMasker for NameMasker {
    fn name(&self) -> &str {
        "name"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        matches!(semantic_type, "name" | "firstName" | "lastName")
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let name: String = match spec.semantic_type.as_str() {
            "firstName" => FirstName().fake(),
            "lastName" => LastName().fake(),
            _ => Name().fake(),
        };
        Ok(SqlValue::Text(name))
    }
}

/// `phone`: a random number, or `format` with each `#` replaced by a digit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneMasker;

impl ValueMasker for PhoneMasker {
    fn name(&self) -> &str {
        "phone"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        semantic_type == "phone"
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let phone = match spec.param_str("format").filter(|f| !f.is_empty()) {
            Some(format) => numerify(format),
            None => PhoneNumber().fake(),
        };
        Ok(SqlValue::Text(phone))
    }
}
