//! Conversion of HTTP request parts into a cache request context.

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::{header::ACCEPT_LANGUAGE, request::Parts},
};
use cachet_core::Principal;
use cachet_service::RequestContext;

/// Collects the request facets cache keys vary on.
///
/// Path parameters are only visible once routing has matched, so this must
/// run inside a route-level layer or handler.
pub async fn request_context(parts: &mut Parts) -> RequestContext {
    let mut context = RequestContext::new(parts.method.as_str());

    if let Some(language) = parts
        .headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
    {
        context = context.with_accept_language(language);
    }

    if let Some(query) = parts.uri.query() {
        context = context.with_query_string(query);
    }

    if let Some(principal) = parts.extensions.get::<Principal>() {
        context = context.with_principal(principal.clone());
    }

    if let Ok(params) = RawPathParams::from_request_parts(parts, &()).await {
        for (name, value) in &params {
            context = context.with_path_param(name, value);
        }
    }

    context
}
