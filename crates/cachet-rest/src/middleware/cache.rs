//! Per-route response caching layer.

use crate::{
    extractors::request_context,
    responses::{from_normalized, into_normalized, AppError},
};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use cachet_config::CacheConfig;
use cachet_core::CachetError;
use cachet_service::{
    CacheGateway, CacheOptions, CacheStatus, CacheWrapper, HandlerIdentity, KeyBuilder,
};
use std::sync::Arc;
use tracing::debug;

/// Response header reporting how the cache served a request.
pub const X_CACHE: &str = "x-cache";

/// Factory for caching layers sharing one store and one configuration.
#[derive(Clone)]
pub struct ResponseCache {
    gateway: Arc<dyn CacheGateway>,
    keys: KeyBuilder,
    config: CacheConfig,
    body_limit: usize,
}

impl ResponseCache {
    /// Creates a factory. `body_limit` caps how large a response may be buffered.
    #[must_use]
    pub fn new(gateway: Arc<dyn CacheGateway>, config: &CacheConfig, body_limit: usize) -> Self {
        Self {
            gateway,
            keys: KeyBuilder::from_config(config),
            config: config.clone(),
            body_limit,
        }
    }

    /// Options seeded from configuration.
    #[must_use]
    pub fn options(&self) -> CacheOptions {
        CacheOptions::from_config(&self.config)
    }

    /// Builds a wrapper for one handler.
    #[must_use]
    pub fn wrapper(&self, identity: HandlerIdentity, options: CacheOptions) -> CacheWrapper {
        CacheWrapper::new(identity, options, self.keys.clone(), self.gateway.clone())
    }

    /// Wraps every method currently on `route` with response caching.
    ///
    /// Returns `route` untouched when caching is disabled in configuration.
    pub fn wrap<S>(
        &self,
        route: MethodRouter<S>,
        identity: HandlerIdentity,
        options: CacheOptions,
    ) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        if !self.config.enabled {
            return route;
        }

        let state = CacheLayerState {
            wrapper: self.wrapper(identity, options),
            body_limit: self.body_limit,
        };
        route.layer(middleware::from_fn_with_state(state, cache_middleware))
    }
}

/// State of one caching layer.
#[derive(Clone)]
pub struct CacheLayerState {
    pub wrapper: CacheWrapper,
    pub body_limit: usize,
}

enum Flow {
    Failed(CachetError),
    Passthrough(Response),
}

impl From<CachetError> for Flow {
    fn from(err: CachetError) -> Self {
        Self::Failed(err)
    }
}

/// Serves a stored response, or runs the route and stores what it returns.
///
/// Sets [`X_CACHE`] to `HIT`, `MISS` or `BYPASS`.
pub async fn cache_middleware(
    State(state): State<CacheLayerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let context = request_context(&mut parts).await;
    let request = Request::from_parts(parts, body);
    let body_limit = state.body_limit;

    let outcome = state
        .wrapper
        .call(&context, move || async move {
            let response = next.run(request).await;
            into_normalized(response, body_limit)
                .await
                .map_err(Flow::Passthrough)
        })
        .await;

    let (mut response, status) = match outcome {
        Ok(outcome) => (from_normalized(outcome.result), outcome.status),
        Err(Flow::Passthrough(response)) => (response, CacheStatus::Bypass),
        Err(Flow::Failed(err)) => {
            debug!(error = %err, handler = %state.wrapper.identity(), "Cache key could not be built");
            return AppError::server(err).into_response();
        }
    };

    response
        .headers_mut()
        .insert(HeaderName::from_static(X_CACHE), HeaderValue::from_static(status.as_str()));
    response
}
