//! Dependency injection module using Shaku.
//!
//! Two modules share the invalidation service and differ in the store:
//! - `RedisModule`: Redis-backed store shared across instances
//! - `MemoryModule`: process-local store for development and tests

use cachet_config::RedisConfig;
use cachet_core::{CachetError, CachetResult};
use cachet_service::{
    CacheGateway, InvalidationService, InvalidationServiceComponent, MemoryCacheService,
    RedisCacheService, RedisCacheServiceParameters,
};
use deadpool_redis::{PoolConfig, Runtime};
use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::info;

// Redis-backed store plus invalidation.
module! {
    pub RedisModule {
        components = [
            RedisCacheService,
            InvalidationServiceComponent,
        ],
        providers = [],
    }
}

// In-memory store plus invalidation.
module! {
    pub MemoryModule {
        components = [
            MemoryCacheService,
            InvalidationServiceComponent,
        ],
        providers = [],
    }
}

/// Builds the Redis module.
///
/// The pool connects lazily, so this succeeds while Redis is unreachable;
/// store calls then fail and the caching layer degrades to misses.
pub fn build_redis_module(config: &RedisConfig) -> CachetResult<RedisModule> {
    let mut redis_cfg = deadpool_redis::Config::from_url(&config.url);
    redis_cfg.pool = Some(PoolConfig::new(config.pool_size));
    let pool = redis_cfg
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| CachetError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

    info!(url = %config.url, pool_size = config.pool_size, "Redis store configured");

    Ok(RedisModule::builder()
        .with_component_parameters::<RedisCacheService>(RedisCacheServiceParameters {
            pool: Some(Arc::new(pool)),
        })
        .build())
}

/// Builds the in-memory module.
#[must_use]
pub fn build_memory_module() -> MemoryModule {
    info!("In-memory store configured");
    MemoryModule::builder().build()
}

/// Convenience accessors over either module.
pub trait CacheResolver {
    fn gateway(&self) -> Arc<dyn CacheGateway>;
    fn invalidation(&self) -> Arc<dyn InvalidationService>;
}

impl<M> CacheResolver for M
where
    M: HasComponent<dyn CacheGateway> + HasComponent<dyn InvalidationService>,
{
    fn gateway(&self) -> Arc<dyn CacheGateway> {
        HasComponent::<dyn CacheGateway>::resolve(self)
    }

    fn invalidation(&self) -> Arc<dyn InvalidationService> {
        HasComponent::<dyn InvalidationService>::resolve(self)
    }
}
