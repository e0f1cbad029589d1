//! Cache key schema.
//!
//! A key is a sequence of fragments, each terminated by [`KEY_DELIMITER`]:
//!
//! ```text
//! {namespace}.{handler}__[{identifier}__]method:{VERB}__[lang:{code}__][user:{id}__][{k}:{v}__...][dependent:[{model},...]__]
//! ```
//!
//! Optional fragments always appear in this order regardless of how the
//! options were assembled. Values taken from the request are escaped so a
//! fragment never contains the delimiter, which lets invalidation locate a
//! fragment by plain substring search. Query parameter names that collide
//! with a dimension label (`user`, `lang`, ...) are escaped as well, so a
//! query fragment can never read as another dimension's fragment.

use crate::{CacheOptions, RequestContext};
use cachet_config::CacheConfig;
use cachet_core::{CachetError, CachetResult, ModelType, Principal, UserId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{self, Display};

/// Terminator appended after every fragment.
pub const KEY_DELIMITER: &str = "__";

/// Labels owned by the built-in dimensions.
const RESERVED_LABELS: [&str; 4] = ["method", "lang", "user", "dependent"];

/// A composed cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Appends one fragment followed by the delimiter.
    ///
    /// The fragment is trusted: callers escape request-derived values first.
    #[must_use]
    pub fn with_fragment(mut self, fragment: &str) -> Self {
        self.0.push_str(fragment);
        self.0.push_str(KEY_DELIMITER);
        self
    }

    /// Returns true if `fragment` occurs anywhere in the key.
    #[must_use]
    pub fn contains(&self, fragment: &str) -> bool {
        self.0.contains(fragment)
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stable identity of a cached handler.
///
/// Carried explicitly by the caching wrapper so that the key depends on the
/// handler itself, never on whichever layer happens to invoke it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerIdentity {
    namespace: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl HandlerIdentity {
    /// Creates an identity from a dotted namespace and a handler name.
    #[must_use]
    pub const fn new(namespace: &'static str, name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            name: Cow::Borrowed(name),
        }
    }

    /// Creates an identity from a Rust module path (`a::b`), rendered as `a.b`.
    #[must_use]
    pub fn from_module_path(module_path: &str, name: &str) -> Self {
        Self {
            namespace: Cow::Owned(module_path.replace("::", ".")),
            name: Cow::Owned(name.to_string()),
        }
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> CachetResult<()> {
        for (label, part) in [("namespace", self.namespace()), ("name", self.name())] {
            if part.is_empty() || part.contains(KEY_DELIMITER) {
                return Err(CachetError::invalid_input(format!(
                    "handler {} '{}' must be non-empty and must not contain '{}'",
                    label, part, KEY_DELIMITER
                )));
            }
        }
        Ok(())
    }
}

impl Display for HandlerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Builds a [`HandlerIdentity`] for a handler defined in the current module.
///
/// ```
/// use cachet_service::handler_identity;
///
/// async fn list_widgets() {}
///
/// let identity = handler_identity!(list_widgets);
/// assert_eq!(identity.name(), "list_widgets");
/// ```
#[macro_export]
macro_rules! handler_identity {
    ($handler:ident) => {
        $crate::HandlerIdentity::from_module_path(module_path!(), stringify!($handler))
    };
}

/// Percent-escapes `%` and `_` so a request-derived value cannot form the delimiter.
#[must_use]
pub fn escape_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['%', '_']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '_' => escaped.push_str("%5F"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Escapes a query parameter name.
///
/// Names equal to a dimension label get their first byte percent-encoded
/// (`user` becomes `%75ser`). Since [`escape_value`] already turns `%` into
/// `%25`, no real parameter name can produce the encoded form.
#[must_use]
pub fn escape_param_name(name: &str) -> Cow<'_, str> {
    let escaped = escape_value(name);
    if !RESERVED_LABELS.contains(&escaped.as_ref()) {
        return escaped;
    }
    let (first, rest) = escaped.split_at(1);
    Cow::Owned(format!("%{:02X}{}", first.as_bytes()[0], rest))
}

/// Base key: handler identity, then the instance identifier when present.
pub fn get_base_key(identity: &HandlerIdentity, identifier: Option<&str>) -> CachetResult<CacheKey> {
    identity.validate()?;
    let key = CacheKey(String::new()).with_fragment(&identity.to_string());
    Ok(match identifier {
        Some(identifier) => key.with_fragment(&escape_value(identifier)),
        None => key,
    })
}

/// Appends `method:{VERB}`.
#[must_use]
pub fn add_method(key: CacheKey, request: &RequestContext) -> CacheKey {
    key.with_fragment(&format!("method:{}", escape_value(request.method())))
}

/// Appends `lang:{code}`, falling back to `default_language`.
#[must_use]
pub fn add_language(key: CacheKey, request: &RequestContext, default_language: &str) -> CacheKey {
    let language = request.accept_language().unwrap_or(default_language);
    key.with_fragment(&format!("lang:{}", escape_value(language)))
}

/// Appends `user:{id}` for authenticated principals; anonymous adds nothing.
#[must_use]
pub fn add_user(key: CacheKey, principal: &Principal) -> CacheKey {
    match principal {
        Principal::User(id) => key.with_fragment(&user_token(id)),
        Principal::Anonymous => key,
    }
}

/// Appends one `{key}:{value}` fragment per query parameter, sorted by key.
///
/// Parameter names go through [`escape_param_name`].
#[must_use]
pub fn add_query_params(key: CacheKey, request: &RequestContext) -> CacheKey {
    request
        .sorted_query_params()
        .into_iter()
        .fold(key, |key, (name, value)| {
            key.with_fragment(&format!("{}:{}", escape_param_name(name), escape_value(value)))
        })
}

/// Appends `dependent:[{model},...]` in the given order. Empty adds nothing.
pub fn add_model_dependencies(key: CacheKey, models: &[ModelType]) -> CachetResult<CacheKey> {
    if models.is_empty() {
        return Ok(key);
    }
    let fragments = models
        .iter()
        .map(get_model_fragment)
        .collect::<CachetResult<Vec<_>>>()?;
    Ok(key.with_fragment(&format!("dependent:[{}]", fragments.join(","))))
}

/// Fragment identifying a user across every key scoped to them.
///
/// Includes the trailing delimiter, so `user:4__` never matches `user:42__`.
pub fn get_user_fragment(principal: &Principal) -> CachetResult<String> {
    match principal {
        Principal::User(id) => Ok(format!("{}{}", user_token(id), KEY_DELIMITER)),
        Principal::Anonymous => Err(CachetError::invalid_input(
            "user fragment requires an authenticated user identity",
        )),
    }
}

/// Fragment identifying a model type: `{namespace}.{name}`.
///
/// This is exactly the text [`add_model_dependencies`] embeds.
pub fn get_model_fragment(model: &ModelType) -> CachetResult<String> {
    for (label, part) in [("namespace", model.namespace()), ("name", model.name())] {
        if part.is_empty()
            || part.contains(KEY_DELIMITER)
            || part.contains(['[', ']', ','])
        {
            return Err(CachetError::invalid_input(format!(
                "model {} '{}' must be non-empty and must not contain '{}', '[', ']' or ','",
                label, part, KEY_DELIMITER
            )));
        }
    }
    Ok(model.to_string())
}

fn user_token(id: &UserId) -> String {
    format!("user:{}", escape_value(id.as_str()))
}

/// Composes full cache keys from request context and handler options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    default_language: String,
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new(CacheConfig::default().default_language)
    }
}

impl KeyBuilder {
    /// Creates a builder with the language used when a request declares none.
    #[must_use]
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
        }
    }

    /// Creates a builder from cache configuration.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.default_language.clone())
    }

    /// Language used when a request declares none.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Builds the key for one request to one handler.
    ///
    /// Fails with `InvalidInput` when the handler identity or a model
    /// dependency cannot be embedded unambiguously.
    pub fn build_key(
        &self,
        identity: &HandlerIdentity,
        request: &RequestContext,
        options: &CacheOptions,
        identifier: Option<&str>,
    ) -> CachetResult<CacheKey> {
        let mut key = get_base_key(identity, identifier)?;
        key = add_method(key, request);

        if options.cache_language {
            key = add_language(key, request, &self.default_language);
        }

        if options.cache_user {
            key = add_user(key, request.principal());
        }

        if options.cache_queryparams {
            key = add_query_params(key, request);
        }

        add_model_dependencies(key, &options.model_dependencies)
    }
}
