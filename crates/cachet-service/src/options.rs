//! Per-handler caching options.

use crate::NormalizedResult;
use cachet_config::CacheConfig;
use cachet_core::{Model, ModelType};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default entry lifetime (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default path parameter naming the cached instance.
pub const DEFAULT_INSTANCE_ID_PARAM: &str = "pk";

/// Options controlling how one handler's responses are keyed and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Entry lifetime.
    pub ttl: Duration,
    /// Path parameter used as the per-instance identifier.
    pub instance_id_param: String,
    /// Key by negotiated language.
    pub cache_language: bool,
    /// Key by authenticated user.
    pub cache_user: bool,
    /// Key by sorted query parameters.
    pub cache_queryparams: bool,
    /// Models whose mutation invalidates entries of this handler.
    pub model_dependencies: Vec<ModelType>,
    /// Status codes eligible for storing.
    pub valid_result_codes: BTreeSet<u16>,
    /// Request methods eligible for storing, upper-case.
    pub valid_methods: BTreeSet<String>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            instance_id_param: DEFAULT_INSTANCE_ID_PARAM.to_string(),
            cache_language: true,
            cache_user: true,
            cache_queryparams: true,
            model_dependencies: Vec::new(),
            valid_result_codes: BTreeSet::from([200]),
            valid_methods: BTreeSet::from(["GET".to_string()]),
        }
    }
}

impl CacheOptions {
    /// Creates options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options whose TTL and instance parameter come from configuration.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            ttl: config.default_ttl(),
            instance_id_param: config.instance_id_param.clone(),
            ..Self::default()
        }
    }

    /// Sets the entry lifetime in seconds.
    #[must_use]
    pub const fn ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl = Duration::from_secs(seconds);
        self
    }

    /// Sets the instance identifier parameter.
    #[must_use]
    pub fn instance_id_param(mut self, name: impl Into<String>) -> Self {
        self.instance_id_param = name.into();
        self
    }

    #[must_use]
    pub const fn cache_language(mut self, enabled: bool) -> Self {
        self.cache_language = enabled;
        self
    }

    #[must_use]
    pub const fn cache_user(mut self, enabled: bool) -> Self {
        self.cache_user = enabled;
        self
    }

    #[must_use]
    pub const fn cache_queryparams(mut self, enabled: bool) -> Self {
        self.cache_queryparams = enabled;
        self
    }

    /// Adds a model dependency. Order of calls is kept in the key.
    #[must_use]
    pub fn depends_on(mut self, model: ModelType) -> Self {
        self.model_dependencies.push(model);
        self
    }

    /// Adds a model dependency by type.
    #[must_use]
    pub fn depends_on_model<M: Model>(self) -> Self {
        self.depends_on(M::model_type())
    }

    /// Replaces the model dependencies.
    #[must_use]
    pub fn model_dependencies(mut self, models: impl IntoIterator<Item = ModelType>) -> Self {
        self.model_dependencies = models.into_iter().collect();
        self
    }

    /// Replaces the status codes eligible for storing.
    #[must_use]
    pub fn valid_result_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.valid_result_codes = codes.into_iter().collect();
        self
    }

    /// Replaces the request methods eligible for storing.
    #[must_use]
    pub fn valid_methods<S: AsRef<str>>(mut self, methods: impl IntoIterator<Item = S>) -> Self {
        self.valid_methods = methods
            .into_iter()
            .map(|m| m.as_ref().to_ascii_uppercase())
            .collect();
        self
    }

    /// Decides whether a fresh handler result may be written to the store.
    ///
    /// Requires an eligible status, an eligible method and a non-empty body.
    #[must_use]
    pub fn is_storable(&self, method: &str, result: &NormalizedResult) -> bool {
        self.valid_result_codes.contains(&result.status)
            && self.valid_methods.contains(method)
            && result.has_body()
    }
}
