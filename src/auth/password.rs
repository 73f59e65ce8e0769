//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Raised only when salting or hashing itself fails
#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashingError(String);

impl From<HashingError> for AppError {
    fn from(e: HashingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// Password hasher with configurable parameters
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create hasher with default parameters (OWASP recommended)
    pub fn new() -> Self {
        // m=64MiB, t=3 iterations, p=4 lanes
        let params = Params::new(65536, 3, 4, None).unwrap_or(Params::DEFAULT);

        Self::with_params(params)
    }

    /// Create hasher from the security section of the configuration
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AppError::Config(format!("Invalid Argon2 params: {}", e)))?;

        Ok(Self::with_params(params))
    }

    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a password into a PHC string (salt and parameters embedded)
    pub fn hash(&self, password: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                HashingError(e.to_string())
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored digest.
    ///
    /// Mismatch and unparsable digests both yield `false`. The final digest
    /// comparison is constant-time inside `argon2`.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is not a valid PHC string: {:?}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Validate password against policy
    pub fn validate_password_policy(password: &str, config: &SecurityConfig) -> Result<(), AppError> {
        if password.chars().count() < config.password_min_length {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                config.password_min_length
            )));
        }

        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "secret1";

        let hash = hasher.hash(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&hash, password));
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = fast_hasher();

        let hash = hasher.hash("secret1").unwrap();
        assert!(!hasher.verify(&hash, "secret2"));
        assert!(!hasher.verify(&hash, ""));
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = fast_hasher();
        let password = "secret1";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Hashes should be different due to salt
        assert_ne!(hash1, hash2);

        // But both should verify correctly
        assert!(hasher.verify(&hash1, password));
        assert!(hasher.verify(&hash2, password));
    }

    #[test]
    fn test_garbage_digest_is_a_mismatch() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("not-a-phc-string", "secret1"));
        assert!(!hasher.verify("", "secret1"));
    }

    #[test]
    fn test_digest_carries_its_own_params() {
        // A digest produced with other params still verifies
        let strong = PasswordHasher::with_params(Params::new(2048, 2, 1, None).unwrap());
        let hash = strong.hash("secret1").unwrap();
        assert!(fast_hasher().verify(&hash, "secret1"));
    }

    #[test]
    fn test_password_policy_validation() {
        let config = SecurityConfig {
            jwt_secret: None,
            allow_insecure_dev_secret: false,
            password_min_length: 6,
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        };

        assert!(PasswordHasher::validate_password_policy("secret1", &config).is_ok());
        assert!(PasswordHasher::validate_password_policy("short", &config).is_err());
    }
}
