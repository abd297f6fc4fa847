//! Behavioral properties of the built-in masker registry.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

use dbmasker_core::{ColumnMaskSpec, MaskerRegistry, SqlValue};
use regex::Regex;

const SEMANTIC_TYPES: &[&str] = &[
    "email",
    "name",
    "firstName",
    "lastName",
    "phone",
    "address",
    "city",
    "postcode",
    "streetAddress",
    "text",
    "randomNumber",
    "date",
    "datetime",
    "numerify",
    "creditCardNumber",
    "company",
    "url",
    "ipv4",
    "uuid",
    "password",
    "somethingUnknown",
];

#[test]
fn test_masked_value_never_equals_original() {
    let registry = MaskerRegistry::new();
    let original = SqlValue::from("john@example.com");

    for semantic_type in SEMANTIC_TYPES {
        let spec = ColumnMaskSpec::new(*semantic_type);
        for _ in 0..5 {
            let masked = registry.mask(&original, &spec).unwrap();
            assert_ne!(masked, original, "type {} returned the original", semantic_type);
            assert!(!masked.is_null(), "type {} returned NULL", semantic_type);
        }
    }
}

#[test]
fn test_null_is_never_masked() {
    let registry = MaskerRegistry::new();
    for semantic_type in SEMANTIC_TYPES {
        let masked = registry
            .mask(&SqlValue::Null, &ColumnMaskSpec::new(*semantic_type))
            .unwrap();
        assert_eq!(masked, SqlValue::Null);
    }
}

#[test]
fn test_random_number_range() {
    let registry = MaskerRegistry::new();
    let spec = ColumnMaskSpec::new("randomNumber")
        .with_param("min", 500)
        .with_param("max", 1000);

    for _ in 0..1000 {
        match registry.mask(&SqlValue::Int(42), &spec).unwrap() {
            SqlValue::Int(n) => assert!((500..=1000).contains(&n), "{} out of range", n),
            other => panic!("expected an integer, got {:?}", other),
        }
    }
}

#[test]
fn test_phone_format() {
    let registry = MaskerRegistry::new();
    let spec = ColumnMaskSpec::new("phone").with_param("format", "###-###-####");
    let pattern = Regex::new(r"^\d{3}-\d{3}-\d{4}$").unwrap();

    for _ in 0..100 {
        let masked = registry.mask(&SqlValue::from("555-123-4567"), &spec).unwrap();
        let text = masked.as_text().unwrap();
        assert!(pattern.is_match(text), "{} does not match", text);
    }
}

#[test]
fn test_unknown_type_uses_fallback() {
    let registry = MaskerRegistry::new();
    assert_eq!(registry.resolve("somethingUnknown").name(), registry.resolve("").name());
    assert_ne!(registry.resolve("email").name(), registry.resolve("").name());
}
