//! Persistence seam for user accounts.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;
use crate::types::user::{NewUser, User};

/// Read/write access to stored users.
///
/// Callers bound every call with the configured context timeout, so
/// implementations do not need their own deadline handling.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new user. Fails with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Look a user up by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Look a user up by id.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;
}
