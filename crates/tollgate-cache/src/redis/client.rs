//! Redis connection handling with bounded connect and command latency.

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{Client, RedisResult};
use tracing::{info, warn};

use tollgate_core::config::cache::RedisCacheConfig;
use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;

/// Shared Redis handle.
///
/// Wraps a reconnecting [`ConnectionManager`] together with the key
/// namespace and the per-command deadline every caller runs under.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
    key_prefix: String,
    command_timeout: Duration,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("key_prefix", &self.key_prefix)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

impl RedisClient {
    /// Opens the connection and confirms it with a PING.
    ///
    /// Fails with [`ErrorKind::Cache`] when the server does not accept the
    /// connection within `connect_timeout_ms`.
    pub async fn connect(config: &RedisCacheConfig) -> AppResult<Self> {
        let target = redact_credentials(&config.url);
        info!(url = %target, timeout_ms = config.connect_timeout_ms, "Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Cache, format!("Invalid Redis URL {target}"), e)
        })?;

        let conn = match tokio::time::timeout(config.connect_timeout(), ConnectionManager::new(client))
            .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(AppError::with_source(
                    ErrorKind::Cache,
                    format!("Failed to connect to Redis at {target}"),
                    e,
                ));
            }
            Err(_) => {
                return Err(AppError::new(
                    ErrorKind::Cache,
                    format!(
                        "Redis at {target} did not accept a connection within {}ms",
                        config.connect_timeout_ms
                    ),
                ));
            }
        };

        let redis = Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            command_timeout: config.command_timeout(),
        };

        if !redis.ping().await? {
            return Err(AppError::new(
                ErrorKind::Cache,
                format!("Redis at {target} answered PING unexpectedly"),
            ));
        }

        info!(url = %target, "Connected to Redis");
        Ok(redis)
    }

    /// Connection handle for issuing commands. Clones share one multiplexed link.
    pub fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Namespaced form of `key`.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    /// Awaits one command under the per-command deadline.
    pub(crate) async fn run<T>(
        &self,
        command: &'static str,
        pending: impl Future<Output = RedisResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.command_timeout, pending).await {
            Ok(result) => result.map_err(|e| {
                AppError::with_source(ErrorKind::Cache, format!("Redis {command} failed: {e}"), e)
            }),
            Err(_) => {
                warn!(
                    command,
                    timeout_ms = self.command_timeout.as_millis() as u64,
                    "Redis command timed out"
                );
                Err(AppError::new(
                    ErrorKind::Cache,
                    format!("Redis {command} timed out"),
                ))
            }
        }
    }

    /// Round-trips a PING; `Ok(false)` for any reply other than `PONG`.
    pub async fn ping(&self) -> AppResult<bool> {
        let mut conn = self.conn_mut();
        let reply: String = self
            .run("PING", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(reply == "PONG")
    }
}

/// Replaces the password portion of a connection URL so it can be logged.
fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****@{host}"),
        None => format!("{scheme}://****@{host}"),
    }
}
