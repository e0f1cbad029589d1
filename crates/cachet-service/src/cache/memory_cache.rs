//! In-process cache gateway.
//!
//! Used when Redis is disabled and as the store in tests. Expired entries
//! are dropped lazily on access, and every [`SWEEP_INTERVAL`] writes a
//! sweep removes the ones nobody reads again.

use super::CacheGateway;
use async_trait::async_trait;
use cachet_core::{CachetResult, HealthCheck, HealthStatus};
use parking_lot::RwLock;
use shaku::Component;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Writes between two sweeps of expired entries.
pub const SWEEP_INTERVAL: usize = 1024;

struct StoredValue {
    value: String,
    /// `None` when the TTL does not fit in an `Instant`.
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Thread-safe in-memory cache gateway with per-entry TTL.
#[derive(Component, Default)]
#[shaku(interface = CacheGateway)]
pub struct MemoryCacheService {
    #[shaku(default)]
    entries: RwLock<HashMap<String, StoredValue>>,
    #[shaku(default)]
    writes: AtomicUsize,
}

impl MemoryCacheService {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().values().filter(|v| v.is_live(now)).count()
    }

    /// Returns true when no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the keys of all live entries, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, v)| v.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, v| v.is_live(now));
        before - entries.len()
    }
}

#[async_trait]
impl CacheGateway for MemoryCacheService {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> CachetResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(stored) if stored.is_live(now) => {
                    debug!("Cache hit for key '{}'", key);
                    return Ok(Some(stored.value.clone()));
                }
                Some(_) => {}
                None => {
                    debug!("Cache miss for key '{}'", key);
                    return Ok(None);
                }
            }
        }

        // Expired: remove unless a concurrent writer already replaced it.
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|v| !v.is_live(now)) {
            entries.remove(key);
        }
        debug!("Cache entry expired for key '{}'", key);
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CachetResult<()> {
        let stored = StoredValue {
            value: value.to_string(),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.write().insert(key.to_string(), stored);
        debug!("Cached key '{}' with TTL {}s", key, ttl.as_secs());

        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            let purged = self.purge_expired();
            debug!("Swept {} expired entries", purged);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CachetResult<bool> {
        let removed = self.entries.write().remove(key).is_some();
        debug!("Deleted key '{}': {}", key, removed);
        Ok(removed)
    }

    async fn delete_by_pattern(&self, substring: &str) -> CachetResult<u64> {
        let now = Instant::now();
        let mut deleted = 0_u64;
        self.entries.write().retain(|key, stored| {
            if !key.contains(substring) {
                return true;
            }
            if stored.is_live(now) {
                deleted += 1;
            }
            false
        });
        debug!("Deleted {} keys containing '{}'", deleted, substring);
        Ok(deleted)
    }
}

#[async_trait]
impl HealthCheck for MemoryCacheService {
    fn name(&self) -> &str {
        "memory"
    }

    async fn check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCacheService::new();
        cache.set_raw("a", "1", TTL).await.unwrap();
        assert_eq!(cache.get_raw("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.get_raw("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = MemoryCacheService::new();
        cache.set_raw("a", "1", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get_raw("a").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = MemoryCacheService::new();
        cache.set_raw("old", "1", Duration::ZERO).await.unwrap();
        cache.set_raw("new", "2", TTL).await.unwrap();
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.keys(), vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn test_oversized_ttl_never_expires() {
        let cache = MemoryCacheService::new();
        cache.set_raw("a", "1", Duration::MAX).await.unwrap();
        cache
            .set_raw("b", "2", Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        assert_eq!(cache.get_raw("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.get_raw("b").await.unwrap(), Some("2".to_string()));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test]
    async fn test_writes_sweep_unread_expired_entries() {
        let cache = MemoryCacheService::new();
        for i in 0..SWEEP_INTERVAL - 1 {
            cache.set_raw(&format!("gone{i}"), "v", Duration::ZERO).await.unwrap();
        }
        assert_eq!(cache.entries.read().len(), SWEEP_INTERVAL - 1);

        cache.set_raw("kept", "v", TTL).await.unwrap();

        assert_eq!(cache.entries.read().len(), 1);
        assert_eq!(cache.keys(), vec!["kept".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_by_pattern_counts_live_entries_only() {
        let cache = MemoryCacheService::new();
        cache.set_raw("user:1__a", "v", TTL).await.unwrap();
        cache.set_raw("user:1__b", "v", Duration::ZERO).await.unwrap();

        let deleted = cache.delete_by_pattern("user:1__").await.unwrap();

        assert_eq!(deleted, 1);
        assert!(cache.entries.read().is_empty());
    }

    #[tokio::test]
    async fn test_reports_healthy() {
        let cache = MemoryCacheService::new();
        assert_eq!(cache.name(), "memory");
        assert!(cache.check().await.is_healthy());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCacheService::new();
        cache.set_raw("a", "1", TTL).await.unwrap();
        assert!(cache.delete("a").await.unwrap());
        assert!(!cache.delete("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pattern_matches_anywhere() {
        let cache = MemoryCacheService::new();
        for key in ["PATTERN", "xPATTERN", "PATTERNx", "xPATTERNx", "xPATTERNPATTERNx", "x"] {
            cache.set_raw(key, "v", TTL).await.unwrap();
        }

        let deleted = cache.delete_by_pattern("PATTERN").await.unwrap();

        assert_eq!(deleted, 5);
        assert_eq!(cache.keys(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_by_pattern_is_literal() {
        let cache = MemoryCacheService::new();
        cache.set_raw("dependent:[shop.Widget]__", "v", TTL).await.unwrap();
        cache.set_raw("dependent:[shop.Order]__", "v", TTL).await.unwrap();

        let deleted = cache.delete_by_pattern("[shop.Widget]").await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(cache.keys(), vec!["dependent:[shop.Order]__".to_string()]);
    }
}
