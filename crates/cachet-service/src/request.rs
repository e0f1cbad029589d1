//! Framework-independent view of an incoming request.

use cachet_core::Principal;
use std::collections::BTreeMap;

/// The request attributes the cache key schema reads.
///
/// The HTTP boundary fills this from the host framework's request type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    method: String,
    accept_language: Option<String>,
    principal: Principal,
    query_params: Vec<(String, String)>,
    path_params: BTreeMap<String, String>,
}

impl RequestContext {
    /// Creates a context for the given HTTP method. The method is upper-cased.
    #[must_use]
    pub fn new(method: impl AsRef<str>) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            ..Self::default()
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get() -> Self {
        Self::new("GET")
    }

    /// Sets the raw `Accept-Language` header value.
    #[must_use]
    pub fn with_accept_language(mut self, value: impl Into<String>) -> Self {
        self.accept_language = Some(value.into());
        self
    }

    /// Sets the principal the request runs as.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    /// Appends one query parameter, keeping repeated keys.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Parses an `application/x-www-form-urlencoded` query string (without `?`).
    #[must_use]
    pub fn with_query_string(mut self, query: &str) -> Self {
        self.query_params.extend(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
        self
    }

    /// Sets a path parameter captured by the router.
    #[must_use]
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// HTTP method, upper-case.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Declared language, if the request carried a non-blank header.
    #[must_use]
    pub fn accept_language(&self) -> Option<&str> {
        self.accept_language
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }

    /// Principal the request runs as.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Query parameters in request order.
    #[must_use]
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    /// Query parameters ordered by key, then value.
    ///
    /// Ordering by value as well keeps repeated keys deterministic.
    #[must_use]
    pub fn sorted_query_params(&self) -> Vec<(&str, &str)> {
        let mut params: Vec<(&str, &str)> = self
            .query_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        params.sort_unstable();
        params
    }

    /// Looks up a path parameter.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}
