//! Cache gateway trait for abstracted store operations.

use cachet_core::{CachetResult, HealthCheck, Interface};
use async_trait::async_trait;
use std::time::Duration;

/// Gateway over a key-value store with TTL expiry and substring deletion.
///
/// Values are JSON strings so the trait stays dyn-compatible; the typed
/// helpers live on [`CacheGatewayExt`]. Every store reports its health
/// through [`HealthCheck`].
#[async_trait]
pub trait CacheGateway: HealthCheck + Interface + Send + Sync {
    /// Get a raw JSON value from the store.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> CachetResult<Option<String>>;

    /// Set a raw JSON value with a TTL. Expiry is enforced by the store.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CachetResult<()>;

    /// Delete a single key.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> CachetResult<bool>;

    /// Delete every key that contains `substring` anywhere.
    ///
    /// The substring is matched literally. Returns the number of keys deleted.
    async fn delete_by_pattern(&self, substring: &str) -> CachetResult<u64>;

    /// Check if the store is enabled.
    fn is_enabled(&self) -> bool;
}

/// Extension trait with typed methods for convenience.
#[async_trait]
pub trait CacheGatewayExt: CacheGateway {
    /// Get a typed value from the store.
    async fn get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> CachetResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => {
                let value: T = serde_json::from_str(&json)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value in the store.
    async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CachetResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }
}

impl<T: CacheGateway + ?Sized> CacheGatewayExt for T {}
