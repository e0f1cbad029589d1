//! Cache store gateways.
//!
//! This module provides the store abstraction with a Redis implementation
//! for production and an in-memory implementation for local runs and tests.

mod gateway;
mod memory_cache;
mod redis_cache;

pub use gateway::{CacheGateway, CacheGatewayExt};
pub use memory_cache::MemoryCacheService;
pub use redis_cache::{RedisCacheService, RedisCacheServiceParameters};
