//! Pattern-based cache invalidation.
//!
//! No dependency index is kept. Model and user fragments are embedded in
//! the key text, so deleting every key that contains a fragment removes
//! every entry related to it. Fragments that are textual prefixes of other
//! fragments over-invalidate: `shop.Widget` also removes entries depending
//! on `shop.WidgetCategory`.

use crate::cache::CacheGateway;
use crate::keys::{get_model_fragment, get_user_fragment};
use async_trait::async_trait;
use cachet_core::{CachetError, CachetResult, Interface, ModelType, Principal};
use shaku::Component;
use std::sync::Arc;
use tracing::info;

/// Invalidation service trait.
#[async_trait]
pub trait InvalidationService: Interface + Send + Sync {
    /// Deletes every stored key containing `fragment`. Returns how many were removed.
    async fn invalidate_by_pattern(&self, fragment: &str) -> CachetResult<u64>;

    /// Deletes every entry that declared `model` as a dependency.
    async fn invalidate_model(&self, model: &ModelType) -> CachetResult<u64>;

    /// Deletes every entry scoped to the given user.
    async fn invalidate_user(&self, principal: &Principal) -> CachetResult<u64>;
}

/// Concrete invalidation service component for Shaku DI.
#[derive(Component)]
#[shaku(interface = InvalidationService)]
pub struct InvalidationServiceComponent {
    #[shaku(inject)]
    gateway: Arc<dyn CacheGateway>,
}

impl InvalidationServiceComponent {
    /// Creates the service over a store gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn CacheGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl InvalidationService for InvalidationServiceComponent {
    async fn invalidate_by_pattern(&self, fragment: &str) -> CachetResult<u64> {
        // An empty pattern is contained in every key.
        if fragment.is_empty() {
            return Err(CachetError::invalid_input(
                "invalidation pattern must not be empty",
            ));
        }

        let deleted = self.gateway.delete_by_pattern(fragment).await?;
        info!(pattern = fragment, deleted, "Invalidated cache entries");
        Ok(deleted)
    }

    async fn invalidate_model(&self, model: &ModelType) -> CachetResult<u64> {
        let fragment = get_model_fragment(model)?;
        self.invalidate_by_pattern(&fragment).await
    }

    async fn invalidate_user(&self, principal: &Principal) -> CachetResult<u64> {
        let fragment = get_user_fragment(principal)?;
        self.invalidate_by_pattern(&fragment).await
    }
}
