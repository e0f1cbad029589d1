//! Main application router.

use crate::{
    controllers::{cache_controller, health_controller, profile_controller, widget_controller},
    middleware::{identity_middleware, logging_middleware, ResponseCache},
    state::AppState,
};
use axum::{middleware, routing::get, Router};
use cachet_config::AppConfig;
use cachet_service::{CacheGateway, InvalidationService};
use shaku::{HasComponent, Module};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;

/// Creates the main application router from a Shaku module.
///
/// The module must provide the store gateway and the invalidation service.
pub fn create_router<M>(module: &M, config: &AppConfig) -> Router
where
    M: Module + HasComponent<dyn CacheGateway> + HasComponent<dyn InvalidationService>,
{
    let gateway: Arc<dyn CacheGateway> = module.resolve();
    let invalidation: Arc<dyn InvalidationService> = module.resolve();

    let cache = ResponseCache::new(gateway.clone(), &config.cache, config.server.max_body_size);
    let state = AppState::new(gateway, invalidation);

    build_router(state, &cache)
}

/// Assembles routes and layers around an existing state.
pub fn build_router(state: AppState, cache: &ResponseCache) -> Router {
    let api_router = Router::new()
        .nest("/widgets", widget_controller::router(cache))
        .nest("/me", profile_controller::router(cache))
        .nest("/cache", cache_controller::router());

    let router = Router::new()
        .merge(health_controller::router())
        .nest("/api/v1", api_router)
        .route("/", get(root))
        .with_state(state)
        .layer(middleware::from_fn(identity_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware));

    info!("Router created with cached widget endpoints");
    router
}

/// Root endpoint handler.
async fn root() -> &'static str {
    "Cachet API v1"
}
