//! Company, network and identifier fields.

use super::ValueMasker;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::models::SqlValue;
use fake::Fake;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::DomainSuffix;
use fake::faker::lorem::en::Word;
use rand::Rng;

/// `company`, `url`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyMasker;

impl ValueMasker for CompanyMasker {
    fn name(&self) -> &str {
        "company"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        matches!(semantic_type, "company" | "url")
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let value = if spec.semantic_type == "url" {
            let host: String = Word().fake();
            let suffix: String = DomainSuffix().fake();
            let path: String = Word().fake();
            format!("https://www.{}.{}/{}", host.to_lowercase(), suffix, path)
        } else {
            CompanyName().fake()
        };
        Ok(SqlValue::Text(value))
    }
}

/// `ipv4`, `ipv6`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpAddressMasker;

impl ValueMasker for IpAddressMasker {
    fn name(&self) -> &str {
        "ip_address"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        matches!(semantic_type, "ipv4" | "ipv6")
    }

    fn generate(&self, _original: &SqlValue, spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let mut rng = rand::rng();
        let value = if spec.semantic_type == "ipv6" {
            let groups: Vec<String> = (0..8)
                .map(|_| format!("{:x}", rng.random::<u16>()))
                .collect();
            groups.join(":")
        } else {
            format!(
                "{}.{}.{}.{}",
                rng.random_range(1..=254u8),
                rng.random::<u8>(),
                rng.random::<u8>(),
                rng.random_range(1..=254u8)
            )
        };
        Ok(SqlValue::Text(value))
    }
}

/// `uuid`: random version 4 UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidMasker;

impl ValueMasker for UuidMasker {
    fn name(&self) -> &str {
        "uuid"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        semantic_type == "uuid"
    }

    fn generate(&self, _original: &SqlValue, _spec: &ColumnMaskSpec) -> Result<SqlValue> {
        Ok(SqlValue::Text(uuid::Uuid::new_v4().to_string()))
    }
}

/// Appends the Luhn check digit to a digit string.
fn with_luhn_check_digit(payload: &str) -> String {
    let sum: u32 = payload
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    format!("{}{}", payload, check)
}

/// `creditCardNumber`: Luhn-valid 16 digit number with a card network prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreditCardMasker;

impl ValueMasker for CreditCardMasker {
    fn name(&self) -> &str {
        "credit_card"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        semantic_type == "creditCardNumber"
    }

    fn generate(&self, _original: &SqlValue, _spec: &ColumnMaskSpec) -> Result<SqlValue> {
        let mut rng = rand::rng();
        let prefix = ["4", "51", "52", "53", "54", "55"][rng.random_range(0..6)];
        let mut payload = prefix.to_string();
        while payload.len() < 15 {
            payload.push(char::from(b'0' + rng.random_range(0..10u8)));
        }
        Ok(SqlValue::Text(with_luhn_check_digit(&payload)))
    }
}
