//! Geographic fields.

use super::ValueMasker;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::models::SqlValue;
use fake::Fake;
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryName, PostCode, StateName, StreetName, ZipCode,
};

fn street_address() -> String {
    let number: String = BuildingNumber().fake();
    let street: String = StreetName().fake();
    format!("{} {}", number, street)
}

/// `address`: one-line postal address.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressMasker;

impl ValueMasker for AddressMasker {
    fn name(&self) -> &str {
        "address"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        semantic_type == "address"
    }

    fn generate(&self, _original: &SqlValue, _spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let city: String = CityName().fake();
        let state: String = StateName().fake();
        let zip: String = ZipCode().fake();
        Ok(SqlValue::Text(format!(
            "{}, {}, {} {}",
            street_address(),
            city,
            state,
            zip
        )))
    }
}

/// Single address components: `city`, `country`, `postcode`, `state`,
/// `street`, `streetName`, `streetAddress`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationMasker;

impl ValueMasker for LocationMasker {
    fn name(&self) -> &str {
        "location"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        matches!(
            semantic_type,
            "city" | "country" | "postcode" | "state" | "street" | "streetName" | "streetAddress"
        )
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let value: String = match spec.semantic_type.as_str() {
            "country" => CountryName().fake(),
            "postcode" => PostCode().fake(),
            "state" => StateName().fake(),
            "street" | "streetName" => StreetName().fake(),
            "streetAddress" => street_address(),
            _ => CityName().fake(),
        };
        Ok(SqlValue::Text(value))
    }
}
