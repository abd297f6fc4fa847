//! Password columns: Argon2id hashes of throwaway random passwords.
//!
//! The plaintext only lives in a zeroizing buffer for the duration of the
//! hash computation.

use super::ValueMasker;
use crate::Result;
use crate::config::ColumnMaskSpec;
use crate::error::DbMaskerError;
use crate::models::SqlValue;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher, SaltString},
};
use rand::Rng;
use rand::distr::Alphanumeric;
use zeroize::Zeroizing;

const PASSWORD_LENGTH: usize = 16;
const SALT_LENGTH: usize = 16;

/// `password`: PHC-format Argon2id hash of a fresh random password.
#[derive(Debug, Clone)]
pub struct PasswordMasker {
    params: Params,
}

impl Default for PasswordMasker {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordMasker {
    /// Creates a masker with custom Argon2 cost parameters.
    ///
    /// # Errors
    /// Returns a configuration error if the parameters are rejected by Argon2.
    pub fn with_costs(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            DbMaskerError::configuration(format!("Invalid Argon2 parameters: {}", e))
        })?;
        Ok(Self { params })
    }

    fn hash_random_password(&self) -> Result<String> {
        let mut rng = rand::rng();
        let password: Zeroizing<String> = Zeroizing::new(
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(PASSWORD_LENGTH)
                .map(char::from)
                .collect(),
        );

        let mut salt = [0u8; SALT_LENGTH];
        rng.fill(&mut salt);
        let salt_string = SaltString::encode_b64(&salt)
            .map_err(|e| DbMaskerError::masking("password", format!("Invalid salt: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let hash = argon2
            .hash_password(password.as_bytes(), &salt_string)
            .map_err(|e| DbMaskerError::masking("password", format!("Hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }
}

impl ValueMasker for PasswordMasker {
    fn name(&self) -> &str {
        "password"
    }

    fn supports(&self, semantic_type: &str) -> bool {
        semantic_type == "password"
    }

    fn generate(&self, _original: &SqlValue, _spec: &ColumnMaskSpec) -> Result<SqlValue> {
        Ok(SqlValue::Text(self.hash_random_password()?))
    }
}
