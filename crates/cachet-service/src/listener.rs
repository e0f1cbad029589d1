//! Reaction to data-model mutations.
//!
//! Whatever dispatches model events (ORM hooks, an outbox consumer, a
//! repository decorator) hands them to [`MutationListener`], which clears
//! the cache entries that may now be stale.

use crate::InvalidationService;
use async_trait::async_trait;
use cachet_core::{CachetResult, DomainEvent, EventHandler, ModelType, Principal, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Kind of change made to a model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

/// Event emitted after a model instance is saved or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelChanged {
    pub model: ModelType,
    pub kind: MutationKind,
    /// Primary key of the affected instance, when known.
    pub instance_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ModelChanged {
    #[must_use]
    pub fn new(model: ModelType, kind: MutationKind, instance_id: Option<String>) -> Self {
        Self {
            model,
            kind,
            instance_id,
            timestamp: Utc::now(),
        }
    }

    /// A create or update.
    #[must_use]
    pub fn saved(model: ModelType, instance_id: impl Into<String>, created: bool) -> Self {
        let kind = if created {
            MutationKind::Created
        } else {
            MutationKind::Updated
        };
        Self::new(model, kind, Some(instance_id.into()))
    }

    /// A delete.
    #[must_use]
    pub fn deleted(model: ModelType, instance_id: impl Into<String>) -> Self {
        Self::new(model, MutationKind::Deleted, Some(instance_id.into()))
    }
}

impl DomainEvent for ModelChanged {
    fn event_type(&self) -> &'static str {
        match self.kind {
            MutationKind::Created => "model.created",
            MutationKind::Updated => "model.updated",
            MutationKind::Deleted => "model.deleted",
        }
    }

    fn aggregate_id(&self) -> String {
        match &self.instance_id {
            Some(id) => format!("{}:{}", self.model, id),
            None => self.model.to_string(),
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn to_json(&self) -> CachetResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Invalidates cache entries when models change.
///
/// Every mutation invalidates the model's fragment. Mutations of the
/// principal model also invalidate everything cached for that user, even
/// when the model invalidation failed; the first error is returned.
#[derive(Clone)]
pub struct MutationListener {
    invalidation: Arc<dyn InvalidationService>,
    user_model: Option<ModelType>,
}

impl MutationListener {
    /// Creates a listener without a principal model.
    #[must_use]
    pub fn new(invalidation: Arc<dyn InvalidationService>) -> Self {
        Self {
            invalidation,
            user_model: None,
        }
    }

    /// Declares which model type represents users.
    #[must_use]
    pub fn with_user_model(mut self, model: ModelType) -> Self {
        self.user_model = Some(model);
        self
    }

    fn is_user_model(&self, model: &ModelType) -> bool {
        self.user_model.as_ref() == Some(model)
    }
}

#[async_trait]
impl EventHandler<ModelChanged> for MutationListener {
    async fn handle(&self, event: &ModelChanged) -> CachetResult<()> {
        debug!(event = event.event_type(), aggregate = %event.aggregate_id(), "Handling model mutation");

        let model_result = self.invalidation.invalidate_model(&event.model).await;

        let user_result = if self.is_user_model(&event.model) {
            match &event.instance_id {
                Some(id) => {
                    let principal = Principal::User(UserId::new(id));
                    self.invalidation.invalidate_user(&principal).await
                }
                None => {
                    warn!(model = %event.model, "User mutation without instance id");
                    Ok(0)
                }
            }
        } else {
            Ok(0)
        };

        // Both run before either error is reported.
        model_result?;
        user_result?;
        Ok(())
    }
}
