//! Core traits shared across crates.

use crate::CachetResult;
use async_trait::async_trait;

/// Trait for domain events.
///
/// Domain events represent something significant that happened
/// in the domain, such as a model instance being saved or deleted.
pub trait DomainEvent: Send + Sync {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the aggregate ID that this event belongs to.
    fn aggregate_id(&self) -> String;

    /// Returns the event timestamp.
    fn timestamp(&self) -> chrono::DateTime<chrono::Utc>;

    /// Serializes the event to JSON.
    fn to_json(&self) -> CachetResult<String>;
}

/// Trait for event handlers.
#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    /// Handles the event.
    async fn handle(&self, event: &E) -> CachetResult<()>;
}

/// Trait for health checks.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Returns the name of this health check.
    fn name(&self) -> &str;

    /// Performs the health check.
    async fn check(&self) -> HealthStatus;
}

/// Health check status.
#[derive(Debug, Clone)]
pub enum HealthStatus {
    /// The component is healthy.
    Healthy,
    /// The component is degraded but functional.
    Degraded(String),
    /// The component is unhealthy.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns true if the status is healthy.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Returns true if the status is unhealthy.
    #[must_use]
    pub const fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }

    /// Returns a short label for reporting.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded(_) => "degraded",
            Self::Unhealthy(_) => "unhealthy",
        }
    }
}
