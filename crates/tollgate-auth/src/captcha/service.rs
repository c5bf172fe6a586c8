//! Challenge issuance and verification against the cache.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tollgate_cache::{CacheManager, keys};
use tollgate_core::config::CaptchaConfig;
use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_core::traits::cache::CacheProvider;
use tollgate_core::types::id::CaptchaSessionId;

use super::problem::MathProblem;
use super::render;
use super::session::{CAPTCHA_TTL, CaptchaSession};

/// What the client receives for a new challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// PNG data URL of the rendered question.
    pub image_url: String,
    /// Plain-text question, for accessibility.
    pub question: String,
    /// Seconds until the challenge expires.
    pub expire_seconds: u64,
}

/// A new challenge together with the handle the client must present back.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub session_id: CaptchaSessionId,
    pub response: ChallengeResponse,
}

/// Issues and verifies math captchas.
#[derive(Debug, Clone)]
pub struct CaptchaService {
    cache: CacheManager,
    width: u32,
    height: u32,
    op_timeout: Duration,
}

impl CaptchaService {
    pub fn new(cache: CacheManager, config: &CaptchaConfig, op_timeout: Duration) -> Self {
        Self {
            cache,
            width: config.image_width,
            height: config.image_height,
            op_timeout,
        }
    }

    /// Generate, render and store a new challenge.
    pub async fn generate(&self) -> AppResult<IssuedChallenge> {
        self.generate_at(Utc::now()).await
    }

    pub async fn generate_at(&self, now: DateTime<Utc>) -> AppResult<IssuedChallenge> {
        // The thread-local generator must not live across an await point.
        let (problem, image_url) = {
            let mut rng = rand::rng();
            let problem = MathProblem::generate_with(&mut rng);
            let image_url =
                render::render_data_url(&problem.question(), self.width, self.height, &mut rng)?;
            (problem, image_url)
        };

        let session_id = CaptchaSessionId::new();
        let session = CaptchaSession {
            question: problem.question(),
            answer: problem.answer(),
            created_at: now,
        };
        let payload = serde_json::to_string(&session)?;
        let key = keys::captcha_session(session_id);
        self.bounded(self.cache.set(&key, &payload, CAPTCHA_TTL))
            .await?;

        debug!(%session_id, operation = ?problem.operation, "Issued captcha challenge");

        Ok(IssuedChallenge {
            session_id,
            response: ChallengeResponse {
                image_url,
                question: session.question,
                expire_seconds: CAPTCHA_TTL.as_secs(),
            },
        })
    }

    /// Verify an answer at the current time.
    pub async fn verify(&self, session_id: &str, answer: &str) -> AppResult<()> {
        self.verify_at(session_id, answer, Utc::now()).await
    }

    /// Verify an answer as of `now`.
    ///
    /// The session is removed before the answer is compared, so every
    /// attempt (right or wrong) consumes it. An unknown or unparseable
    /// session id is reported as `Expired`.
    pub async fn verify_at(&self, session_id: &str, answer: &str, now: DateTime<Utc>) -> AppResult<()> {
        let Ok(session_id) = session_id.trim().parse::<CaptchaSessionId>() else {
            return Err(AppError::expired("Captcha session not found or expired"));
        };

        let key = keys::captcha_session(session_id);
        let Some(raw) = self.bounded(self.cache.take(&key)).await? else {
            debug!(%session_id, "Captcha session missing");
            return Err(AppError::expired("Captcha session not found or expired"));
        };

        let session: CaptchaSession = serde_json::from_str(&raw)?;
        session
            .check(answer, now)
            .inspect_err(|e| debug!(%session_id, kind = %e.kind, "Captcha rejected"))
    }

    async fn bounded<T>(&self, op: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(error = %e, "Captcha store unavailable");
                Err(AppError::with_source(
                    ErrorKind::Unavailable,
                    "Captcha store unavailable",
                    e,
                ))
            }
            Err(_) => {
                warn!("Captcha store timed out");
                Err(AppError::unavailable("Captcha store timed out"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeDelta;
    use tollgate_cache::memory::MemoryCacheProvider;
    use tollgate_core::config::cache::MemoryCacheConfig;

    fn service() -> CaptchaService {
        let cache = CacheManager::from_provider(Arc::new(MemoryCacheProvider::new(
            &MemoryCacheConfig { max_capacity: 100 },
        )));
        CaptchaService::new(cache, &CaptchaConfig::default(), Duration::from_secs(1))
    }

    async fn stored_answer(service: &CaptchaService, id: CaptchaSessionId) -> i64 {
        let session: CaptchaSession = service
            .cache
            .get_json(&keys::captcha_session(id))
            .await
            .unwrap()
            .unwrap();
        session.answer
    }

    #[tokio::test]
    async fn test_correct_answer_accepted_once() {
        let service = service();
        let issued = service.generate().await.unwrap();
        let answer = stored_answer(&service, issued.session_id).await;
        let id = issued.session_id.to_string();

        service.verify(&id, &answer.to_string()).await.unwrap();
        let err = service.verify(&id, &answer.to_string()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_wrong_answer_consumes_session() {
        let service = service();
        let issued = service.generate().await.unwrap();
        let answer = stored_answer(&service, issued.session_id).await;
        let id = issued.session_id.to_string();

        let err = service
            .verify(&id, &(answer + 1).to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncorrectAnswer);

        let err = service.verify(&id, &answer.to_string()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_late_answer_is_expired() {
        let service = service();
        let created = Utc::now();
        let issued = service.generate_at(created).await.unwrap();
        let answer = stored_answer(&service, issued.session_id).await;

        let err = service
            .verify_at(
                &issued.session_id.to_string(),
                &answer.to_string(),
                created + TimeDelta::seconds(301),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_response_shape() {
        let service = service();
        let issued = service.generate().await.unwrap();
        assert!(issued.response.image_url.starts_with("data:image/png;base64,"));
        assert!(issued.response.question.ends_with("= ?"));
        assert_eq!(issued.response.expire_seconds, 300);
    }

    #[tokio::test]
    async fn test_unknown_session_is_expired() {
        let service = service();
        let err = service.verify("", "1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
        let err = service
            .verify(&CaptchaSessionId::new().to_string(), "1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);
    }
}
