//! Application state for Axum handlers.

use crate::repository::{Profile, ProfileRepository, WidgetRepository};
use cachet_core::{EventHandler, Model};
use cachet_service::{CacheGateway, InvalidationService, ModelChanged, MutationListener};
use std::sync::Arc;
use tracing::warn;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub widgets: Arc<WidgetRepository>,
    pub profiles: Arc<ProfileRepository>,
    pub gateway: Arc<dyn CacheGateway>,
    pub invalidation: Arc<dyn InvalidationService>,
    pub listener: MutationListener,
}

impl AppState {
    /// Creates the state with empty repositories.
    ///
    /// [`Profile`] is registered as the user model, so profile writes also
    /// clear the entries cached for that user.
    pub fn new(gateway: Arc<dyn CacheGateway>, invalidation: Arc<dyn InvalidationService>) -> Self {
        Self {
            widgets: Arc::new(WidgetRepository::new()),
            profiles: Arc::new(ProfileRepository::new()),
            gateway,
            listener: MutationListener::new(invalidation.clone())
                .with_user_model(Profile::model_type()),
            invalidation,
        }
    }

    /// Dispatches a mutation to the listener.
    ///
    /// The write has already happened, so invalidation failures are logged
    /// rather than failing the request.
    pub async fn publish(&self, event: ModelChanged) {
        if let Err(e) = self.listener.handle(&event).await {
            warn!(model = %event.model, error = %e, "Cache invalidation after mutation failed");
        }
    }
}
