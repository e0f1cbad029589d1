//! Redis-backed cache gateway.

use super::CacheGateway;
use async_trait::async_trait;
use cachet_core::{CachetError, CachetResult, HealthCheck, HealthStatus};
use deadpool_redis::{redis::AsyncCommands, Pool};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Number of keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 500;

/// Redis-based cache gateway.
#[derive(Component)]
#[shaku(interface = CacheGateway)]
pub struct RedisCacheService {
    /// Redis connection pool. `None` disables the store.
    pool: Option<Arc<Pool>>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a no-op cache service (for when caching is disabled).
    ///
    /// Every lookup misses and every write is dropped.
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> CachetResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool.get().await.map_err(|e| {
                CachetError::Cache(format!("Failed to get Redis connection: {}", e))
            }),
            None => Err(CachetError::Cache("Cache is disabled".to_string())),
        }
    }
}

/// Escapes Redis glob metacharacters so `substring` matches literally.
///
/// Cache keys carry `[` and `]` in their dependency fragment, which `MATCH`
/// would otherwise read as a character class.
pub(crate) fn glob_escape(substring: &str) -> String {
    let mut escaped = String::with_capacity(substring.len() + 2);
    for c in substring.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl CacheGateway for RedisCacheService {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> CachetResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            CachetError::Cache(format!("Failed to get key '{}': {}", key, e))
        })?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CachetResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await.map_err(|e| {
            CachetError::Cache(format!("Failed to set key '{}': {}", key, e))
        })?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CachetResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn.del(key).await.map_err(|e| {
            CachetError::Cache(format!("Failed to delete key '{}': {}", key, e))
        })?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn delete_by_pattern(&self, substring: &str) -> CachetResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let pattern = format!("*{}*", glob_escape(substring));

        let mut cursor: u64 = 0;
        let mut total: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CachetError::Cache(format!("Failed to scan keys: {}", e)))?;

            if !keys.is_empty() {
                let deleted: i64 = conn.del(&keys).await.map_err(|e| {
                    CachetError::Cache(format!("Failed to delete keys: {}", e))
                })?;
                total += u64::try_from(deleted).unwrap_or(0);
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Deleted {} keys containing '{}'", total, substring);
        Ok(total)
    }
}

#[async_trait]
impl HealthCheck for RedisCacheService {
    fn name(&self) -> &str {
        "redis"
    }

    async fn check(&self) -> HealthStatus {
        if !self.is_enabled() {
            return HealthStatus::Degraded("cache disabled".to_string());
        }

        let mut conn = match self.get_conn().await {
            Ok(conn) => conn,
            Err(e) => return HealthStatus::Unhealthy(e.to_string()),
        };

        let pong: Result<String, _> = deadpool_redis::redis::cmd("PING")
            .query_async(&mut conn)
            .await;

        match pong {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(format!("PING failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_cache() {
        let cache = RedisCacheService::disabled();
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_cache_misses_and_drops_writes() {
        let cache = RedisCacheService::disabled();
        cache
            .set_raw("k", "v", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get_raw("k").await.unwrap(), None);
        assert_eq!(cache.delete_by_pattern("k").await.unwrap(), 0);
        assert!(!cache.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_cache_reports_degraded() {
        let cache = RedisCacheService::disabled();
        assert!(!cache.check().await.is_healthy());
        assert_eq!(cache.name(), "redis");
    }

    #[test]
    fn test_glob_escape_plain_text_unchanged() {
        assert_eq!(glob_escape("shop.Widget"), "shop.Widget");
        assert_eq!(glob_escape("user:42__"), "user:42__");
    }

    #[test]
    fn test_glob_escape_metacharacters() {
        assert_eq!(
            glob_escape("dependent:[shop.Widget]"),
            "dependent:\\[shop.Widget\\]"
        );
        assert_eq!(glob_escape("a*b?c\\d"), "a\\*b\\?c\\\\d");
    }
}
