//! Redis cache provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use tollgate_core::result::AppResult;
use tollgate_core::traits::cache::CacheProvider;

use super::client::RedisClient;

/// Read the counter, increment unless at the cap, arm the TTL on creation.
///
/// KEYS[1] = counter key, ARGV[1] = cap, ARGV[2] = window in milliseconds.
/// Returns the count observed before the increment.
const INCR_CAPPED_SCRIPT: &str = r#"
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
if current >= tonumber(ARGV[1]) then
    return current
end
local updated = redis.call('INCR', KEYS[1])
if updated == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[2])
end
return current
"#;

/// Redis-backed cache provider.
#[derive(Debug, Clone)]
pub struct RedisCacheProvider {
    client: RedisClient,
}

impl RedisCacheProvider {
    /// Create a new Redis cache provider.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl CacheProvider for RedisCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        self.client.run("GET", conn.get(&full_key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        self.client
            .run(
                "SET",
                redis::cmd("SET")
                    .arg(&full_key)
                    .arg(value)
                    .arg("PX")
                    .arg(ttl_millis(ttl))
                    .query_async(&mut conn),
            )
            .await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        self.client.run("DEL", conn.del(&full_key)).await
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        self.client
            .run(
                "GETDEL",
                redis::cmd("GETDEL").arg(&full_key).query_async(&mut conn),
            )
            .await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        self.client.run("EXISTS", conn.exists(&full_key)).await
    }

    async fn incr_capped(&self, key: &str, cap: u64, window: Duration) -> AppResult<u64> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();
        let script = redis::Script::new(INCR_CAPPED_SCRIPT);
        let mut invocation = script.key(&full_key);
        invocation.arg(cap).arg(ttl_millis(window));
        self.client
            .run("EVALSHA", invocation.invoke_async(&mut conn))
            .await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.client.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_secs(60)), 60_000);
    }
}
