//! Response caching around a handler.

use crate::cache::{CacheGateway, CacheGatewayExt};
use crate::{CacheKey, CacheOptions, HandlerIdentity, KeyBuilder, NormalizedResult, RequestContext};
use cachet_core::{CachetError, CachetResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a request was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store; the handler did not run.
    Hit,
    /// Handler ran and its result was stored.
    Miss,
    /// Handler ran and its result was not eligible for storing.
    Bypass,
}

impl CacheStatus {
    /// Value for the `X-Cache` response header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a cached call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    pub result: NormalizedResult,
    pub status: CacheStatus,
    pub key: CacheKey,
}

/// Caches the responses of one handler.
///
/// Store failures never fail the request: a failed lookup counts as a miss
/// and a failed write is logged and dropped.
#[derive(Clone)]
pub struct CacheWrapper {
    identity: HandlerIdentity,
    options: CacheOptions,
    keys: KeyBuilder,
    gateway: Arc<dyn CacheGateway>,
}

impl CacheWrapper {
    /// Creates a wrapper for the handler with the given identity.
    #[must_use]
    pub fn new(
        identity: HandlerIdentity,
        options: CacheOptions,
        keys: KeyBuilder,
        gateway: Arc<dyn CacheGateway>,
    ) -> Self {
        Self {
            identity,
            options,
            keys,
            gateway,
        }
    }

    /// Identity of the wrapped handler.
    #[must_use]
    pub const fn identity(&self) -> &HandlerIdentity {
        &self.identity
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Computes the key a request maps to.
    pub fn cache_key(&self, request: &RequestContext) -> CachetResult<CacheKey> {
        let identifier = request.path_param(&self.options.instance_id_param);
        self.keys
            .build_key(&self.identity, request, &self.options, identifier)
    }

    /// Serves `request` from the store, or runs `handler` and stores its result.
    ///
    /// The handler runs at most once and not at all on a hit. Handler errors
    /// are returned unchanged and nothing is stored for that call.
    pub async fn call<F, Fut, E>(&self, request: &RequestContext, handler: F) -> Result<CacheOutcome, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<NormalizedResult, E>>,
        E: From<CachetError>,
    {
        let key = self.cache_key(request)?;

        if let Some(result) = self.lookup(&key).await {
            debug!(key = %key, handler = %self.identity, "Serving cached response");
            return Ok(CacheOutcome {
                result,
                status: CacheStatus::Hit,
                key,
            });
        }

        let result = handler().await?;

        let status = if self.options.is_storable(request.method(), &result) {
            self.store(&key, &result).await;
            CacheStatus::Miss
        } else {
            debug!(
                key = %key,
                status = result.status,
                method = request.method(),
                "Response not eligible for caching"
            );
            CacheStatus::Bypass
        };

        Ok(CacheOutcome { result, status, key })
    }

    async fn lookup(&self, key: &CacheKey) -> Option<NormalizedResult> {
        match self.gateway.get::<NormalizedResult>(key.as_str()).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn store(&self, key: &CacheKey, result: &NormalizedResult) {
        if let Err(e) = self.gateway.set(key.as_str(), result, self.options.ttl).await {
            warn!(key = %key, error = %e, "Failed to store response");
        }
    }
}

impl fmt::Debug for CacheWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheWrapper")
            .field("identity", &self.identity)
            .field("options", &self.options)
            .field("keys", &self.keys)
            .field("gateway_enabled", &self.gateway.is_enabled())
            .finish()
    }
}
