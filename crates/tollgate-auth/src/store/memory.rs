//! Process-local user store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::user_store::UserStore;
use tollgate_core::types::id::UserId;
use tollgate_core::types::user::{NewUser, User};

/// In-memory [`UserStore`]. Emails are unique case-insensitively.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<UserId, User>,
    /// Lowercased email → id.
    by_email: DashMap<String, UserId>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a user. Outstanding refresh tokens for it stop working.
    pub fn remove(&self, id: UserId) -> Option<User> {
        let (_, user) = self.users.remove(&id)?;
        self.by_email.remove(&user.email.to_lowercase());
        info!(user_id = %id, "User removed");
        Some(user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let email_key = user.email.to_lowercase();
        match self.by_email.entry(email_key) {
            Entry::Occupied(_) => Err(AppError::conflict("User already exists with the given email")),
            Entry::Vacant(slot) => {
                let stored = User {
                    id: UserId::new(),
                    name: user.name,
                    email: user.email,
                    password_hash: user.password_hash,
                    created_at: Utc::now(),
                };
                self.users.insert(stored.id, stored.clone());
                slot.insert(stored.id);
                Ok(stored)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let Some(id) = self.by_email.get(&email.to_lowercase()).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::error::ErrorKind;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "erin".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("Erin@Example.com")).await.unwrap();
        let by_email = store.find_by_email("erin@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(store.find_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@example.com")).await.unwrap();
        let err = store.create(new_user("A@example.com")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_frees_email() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@example.com")).await.unwrap();
        assert!(store.remove(user.id).is_some());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
        assert!(store.create(new_user("a@example.com")).await.is_ok());
    }
}
