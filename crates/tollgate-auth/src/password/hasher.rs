//! Argon2id password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::password::PasswordHasher;

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    /// Hashes a plaintext password using Argon2id with a random salt.
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("hunter22", &hash).unwrap());
        assert!(!hasher.verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        let hasher = Argon2PasswordHasher::new();
        assert_ne!(
            hasher.hash_password("same").unwrap(),
            hasher.hash_password("same").unwrap()
        );
    }

    #[test]
    fn test_corrupt_hash_is_error() {
        let hasher = Argon2PasswordHasher::new();
        assert!(hasher.verify_password("x", "not-a-hash").is_err());
    }
}
