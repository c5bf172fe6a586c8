//! Rotation of a refresh token into a new access/refresh pair.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::user_store::UserStore;

use crate::token::claims::RefreshClaims;
use crate::token::{TokenIssuer, TokenPair, TokenSettings, TokenVerifier};

/// Progress of a single refresh, recorded in logs on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    ReceivedToken,
    Verified,
    UserResolved,
    Reissued,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReceivedToken => write!(f, "received_token"),
            Self::Verified => write!(f, "verified"),
            Self::UserResolved => write!(f, "user_resolved"),
            Self::Reissued => write!(f, "reissued"),
        }
    }
}

/// Exchanges a valid refresh token for a fresh token pair.
///
/// The presented refresh token stays valid until its own expiry; deleting
/// the user is the only way to stop it from being exchanged again.
#[derive(Debug, Clone)]
pub struct RefreshCoordinator {
    verifier: TokenVerifier,
    issuer: TokenIssuer,
    settings: TokenSettings,
    users: Arc<dyn UserStore>,
    lookup_timeout: Duration,
}

impl RefreshCoordinator {
    pub fn new(
        verifier: TokenVerifier,
        issuer: TokenIssuer,
        settings: TokenSettings,
        users: Arc<dyn UserStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            issuer,
            settings,
            users,
            lookup_timeout,
        }
    }

    /// Rotate `refresh_token` at the current time.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        self.refresh_at(refresh_token, Utc::now()).await
    }

    /// Rotate `refresh_token` as of `now`.
    ///
    /// Returns both new tokens or an error, never one without the other.
    pub async fn refresh_at(&self, refresh_token: &str, now: DateTime<Utc>) -> AppResult<TokenPair> {
        let mut stage = RefreshStage::ReceivedToken;

        let user_id = self
            .verifier
            .verify_at::<RefreshClaims>(refresh_token, &self.settings.refresh_secret, now)
            .inspect_err(|e| debug!(%stage, kind = %e.kind, "Refresh token rejected"))?;
        stage = RefreshStage::Verified;

        let user = match tokio::time::timeout(self.lookup_timeout, self.users.find_by_id(user_id))
            .await
        {
            Ok(found) => found?,
            Err(_) => {
                warn!(%stage, %user_id, "User lookup timed out during refresh");
                return Err(AppError::unavailable("User store did not respond in time"));
            }
        };
        let Some(user) = user else {
            debug!(%stage, %user_id, "Refresh subject no longer exists");
            return Err(AppError::user_not_found("User not found"));
        };
        stage = RefreshStage::UserResolved;

        let pair = self
            .issuer
            .issue_pair_at(&user.principal(), &self.settings, now)
            .inspect_err(|e| warn!(%stage, error = %e, "Failed to reissue tokens"))?;
        stage = RefreshStage::Reissued;

        info!(%stage, %user_id, "Token pair refreshed");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use tollgate_core::error::ErrorKind;
    use tollgate_core::traits::user_store::UserStore;
    use tollgate_core::types::id::UserId;
    use tollgate_core::types::user::{NewUser, User};

    use crate::store::MemoryUserStore;
    use crate::token::claims::AccessClaims;

    fn settings() -> TokenSettings {
        TokenSettings {
            access_secret: "access".to_string(),
            refresh_secret: "refresh".to_string(),
            access_ttl_hours: 1,
            refresh_ttl_hours: 24,
        }
    }

    fn coordinator(users: Arc<dyn UserStore>) -> RefreshCoordinator {
        RefreshCoordinator::new(
            TokenVerifier::new("Bearer "),
            TokenIssuer::new("Bearer "),
            settings(),
            users,
            Duration::from_millis(200),
        )
    }

    async fn seeded_store() -> (Arc<MemoryUserStore>, User) {
        let store = Arc::new(MemoryUserStore::new());
        let user = store
            .create(NewUser {
                name: "dana".to_string(),
                email: "dana@example.com".to_string(),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_refresh_returns_new_pair() {
        let (store, user) = seeded_store().await;
        let coordinator = coordinator(store);
        let refresh = TokenIssuer::new("Bearer ")
            .issue_refresh_token(&user.principal(), "refresh", 24)
            .unwrap();

        let pair = coordinator.refresh(&refresh).await.unwrap();
        let verifier = TokenVerifier::new("Bearer ");
        let subject = verifier
            .verify::<AccessClaims>(&pair.access_token, "access")
            .unwrap();
        assert_eq!(subject, user.id);
        assert!(
            verifier
                .verify::<RefreshClaims>(&pair.refresh_token, "refresh")
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let (store, user) = seeded_store().await;
        let coordinator = coordinator(store);
        let issued = Utc::now() - TimeDelta::hours(25);
        let refresh = TokenIssuer::new("Bearer ")
            .issue_refresh_token_at(&user.principal(), "refresh", 24, issued)
            .unwrap();
        let err = coordinator.refresh(&refresh).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_access_token_cannot_refresh() {
        let (store, user) = seeded_store().await;
        let coordinator = coordinator(store);
        let access = TokenIssuer::new("Bearer ")
            .issue_access_token(&user.principal(), "access", 1)
            .unwrap();
        let err = coordinator.refresh(&access).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_deleted_user_is_not_found() {
        let (store, user) = seeded_store().await;
        let coordinator = coordinator(store.clone());
        let refresh = TokenIssuer::new("Bearer ")
            .issue_refresh_token(&user.principal(), "refresh", 24)
            .unwrap();
        store.remove(user.id);
        let err = coordinator.refresh(&refresh).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UserNotFound);
    }

    #[derive(Debug)]
    struct StalledStore;

    #[async_trait]
    impl UserStore for StalledStore {
        async fn create(&self, _user: NewUser) -> AppResult<User> {
            unreachable!()
        }

        async fn find_by_email(&self, _email: &str) -> AppResult<Option<User>> {
            unreachable!()
        }

        async fn find_by_id(&self, _id: UserId) -> AppResult<Option<User>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_is_unavailable() {
        let coordinator = coordinator(Arc::new(StalledStore));
        let principal = tollgate_core::types::user::Principal {
            id: UserId::new(),
            display_name: "x".to_string(),
        };
        let refresh = TokenIssuer::new("Bearer ")
            .issue_refresh_token(&principal, "refresh", 24)
            .unwrap();
        let err = coordinator.refresh(&refresh).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable);
        assert!(err.is_retryable());
    }
}
