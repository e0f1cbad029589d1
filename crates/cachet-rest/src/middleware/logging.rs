//! Request logging middleware.

use super::X_CACHE;
use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

/// Logs each completed request with its cache status, when one was set.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let cache = response
        .headers()
        .get(X_CACHE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    info!(
        target: "http",
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        cache,
        duration_ms = %start.elapsed().as_millis(),
        "HTTP request completed"
    );

    response
}
