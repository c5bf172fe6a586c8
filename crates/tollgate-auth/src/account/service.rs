//! Account flows that end in a freshly issued token pair.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::password::PasswordHasher;
use tollgate_core::traits::user_store::UserStore;
use tollgate_core::types::user::{NewUser, User};

use crate::captcha::CaptchaService;
use crate::token::{TokenIssuer, TokenPair, TokenSettings};

/// Input for signup.
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A captcha session id and the submitted answer.
#[derive(Debug, Clone)]
pub struct CaptchaAnswer {
    pub session_id: String,
    pub answer: String,
}

/// Input for login.
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub captcha: Option<CaptchaAnswer>,
}

/// The authenticated user and the tokens issued for it.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

/// Password hashed once and verified against when the email is unknown,
/// so both login failures pay the same hashing cost.
const UNKNOWN_USER_PASSWORD: &str = "tollgate-unknown-user";

/// Signup and login on top of the user store, hasher and captcha.
#[derive(Debug, Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    captcha: CaptchaService,
    issuer: TokenIssuer,
    settings: TokenSettings,
    captcha_required: bool,
    store_timeout: Duration,
    unknown_user_hash: Arc<OnceCell<String>>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        captcha: CaptchaService,
        issuer: TokenIssuer,
        settings: TokenSettings,
        captcha_required: bool,
        store_timeout: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            captcha,
            issuer,
            settings,
            captcha_required,
            store_timeout,
            unknown_user_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Register a new user and sign it in.
    pub async fn signup(&self, input: SignupInput) -> AppResult<AuthOutcome> {
        if self
            .bounded(self.users.find_by_email(&input.email))
            .await?
            .is_some()
        {
            return Err(AppError::conflict("User already exists with the given email"));
        }

        let password_hash = self.hasher.hash_password(&input.password)?;
        let user = self
            .bounded(self.users.create(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
            }))
            .await?;

        let tokens = self.issuer.issue_pair(&user.principal(), &self.settings)?;
        info!(user_id = %user.id, "User signed up");
        Ok(AuthOutcome { user, tokens })
    }

    /// Authenticate by email and password.
    ///
    /// The captcha is checked (and consumed) before credentials so that a
    /// failed guess always costs a fresh challenge. Unknown emails and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthOutcome> {
        if self.captcha_required {
            let Some(captcha) = &input.captcha else {
                return Err(AppError::validation("Captcha answer is required"));
            };
            self.captcha
                .verify(&captcha.session_id, &captcha.answer)
                .await?;
        }

        let Some(user) = self.bounded(self.users.find_by_email(&input.email)).await? else {
            return Err(self.reject_unknown_user(&input.password).await);
        };

        if !self
            .hasher
            .verify_password(&input.password, &user.password_hash)?
        {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::authentication("Invalid credentials"));
        }

        let tokens = self.issuer.issue_pair(&user.principal(), &self.settings)?;
        info!(user_id = %user.id, "User logged in");
        Ok(AuthOutcome { user, tokens })
    }

    /// Burn a password verification before rejecting an unknown email.
    async fn reject_unknown_user(&self, password: &str) -> AppError {
        let hash = self
            .unknown_user_hash
            .get_or_try_init(|| async { self.hasher.hash_password(UNKNOWN_USER_PASSWORD) })
            .await;
        match hash {
            Ok(hash) => {
                let _ = self.hasher.verify_password(password, hash);
            }
            Err(e) => warn!(error = %e, "Failed to prepare unknown-user hash"),
        }
        AppError::authentication("Invalid credentials")
    }

    async fn bounded<T>(&self, op: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        tokio::time::timeout(self.store_timeout, op)
            .await
            .map_err(|_| AppError::unavailable("User store did not respond in time"))?
    }
}
