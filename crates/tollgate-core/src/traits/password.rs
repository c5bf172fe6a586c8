//! Password hashing abstraction.

use crate::result::AppResult;

/// One-way password hashing.
///
/// Implementations must produce self-describing hashes (algorithm,
/// parameters and salt embedded) so verification needs no extra state.
pub trait PasswordHasher: Send + Sync + std::fmt::Debug + 'static {
    /// Hash a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; errors only when the stored hash
    /// cannot be parsed.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
