//! Identity middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use cachet_core::Principal;
use tracing::debug;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Attaches a [`Principal`] to the request extensions.
///
/// The id is taken from [`USER_ID_HEADER`]; requests without it are
/// anonymous. Authentication itself happens upstream.
pub async fn identity_middleware(mut request: Request<Body>, next: Next) -> Response {
    let principal = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or(Principal::Anonymous, |id| Principal::user(id));

    if let Some(id) = principal.user_id() {
        debug!(user = %id, "Request identified");
    }

    request.extensions_mut().insert(principal);
    next.run(request).await
}
