//! Data-model type metadata.
//!
//! Cached responses declare which model types they depend on. Only the
//! schema identity of a model matters here: its namespace (application
//! label) and its type name.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display};

/// Schema identity of a data-model type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelType {
    namespace: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl ModelType {
    /// Creates a model type from static schema metadata.
    #[must_use]
    pub const fn new(namespace: &'static str, name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            name: Cow::Borrowed(name),
        }
    }

    /// Creates a model type from runtime strings, e.g. names read from an event payload.
    #[must_use]
    pub fn from_parts(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Cow::Owned(namespace.into()),
            name: Cow::Owned(name.into()),
        }
    }

    /// Returns the namespace (application label).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Implemented by domain types that participate in cache invalidation.
///
/// ```
/// use cachet_core::Model;
///
/// struct Widget;
///
/// impl Model for Widget {
///     const NAMESPACE: &'static str = "shop";
///     const NAME: &'static str = "Widget";
/// }
///
/// assert_eq!(Widget::model_type().to_string(), "shop.Widget");
/// ```
pub trait Model {
    /// Application label the model belongs to.
    const NAMESPACE: &'static str;
    /// Type name of the model.
    const NAME: &'static str;

    /// Returns the schema identity of this model.
    #[must_use]
    fn model_type() -> ModelType {
        ModelType::new(Self::NAMESPACE, Self::NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Order;

    impl Model for Order {
        const NAMESPACE: &'static str = "shop";
        const NAME: &'static str = "Order";
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::new("shop", "Widget").to_string(), "shop.Widget");
    }

    #[test]
    fn test_static_and_owned_types_are_equal() {
        assert_eq!(
            ModelType::new("shop", "Widget"),
            ModelType::from_parts("shop".to_string(), "Widget")
        );
    }

    #[test]
    fn test_model_trait() {
        let model = Order::model_type();
        assert_eq!(model.namespace(), "shop");
        assert_eq!(model.name(), "Order");
    }
}
