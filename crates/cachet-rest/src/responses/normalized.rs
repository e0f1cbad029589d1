//! Conversion between Axum responses and [`NormalizedResult`].

use axum::{
    body::{to_bytes, Body, HttpBody},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING},
        HeaderName, HeaderValue, StatusCode,
    },
    response::Response,
};
use cachet_service::NormalizedResult;
use tracing::{debug, warn};

/// Buffers a response into a [`NormalizedResult`].
///
/// Responses that cannot be represented (streaming or oversized bodies,
/// non UTF-8 bodies) are handed back as `Err` so they can be served
/// unchanged.
pub async fn into_normalized(response: Response, limit: usize) -> Result<NormalizedResult, Response> {
    let (parts, body) = response.into_parts();

    let fits = body
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= limit as u64);
    if !fits {
        debug!(status = parts.status.as_u16(), "Body unbounded or over limit, not normalizing");
        return Err(Response::from_parts(parts, body));
    }

    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to buffer response body");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return Err(response);
        }
    };

    let body = match String::from_utf8(bytes.to_vec()) {
        Ok(body) => body,
        Err(_) => {
            debug!("Body is not UTF-8, not normalizing");
            return Err(Response::from_parts(parts, Body::from(bytes)));
        }
    };

    let mut result = NormalizedResult::new(parts.status.as_u16(), body);
    for (name, value) in &parts.headers {
        if *name == CONTENT_LENGTH || *name == TRANSFER_ENCODING {
            continue;
        }
        let Ok(value) = value.to_str() else {
            debug!(header = %name, "Dropping non-visible-ASCII header");
            continue;
        };
        if *name == CONTENT_TYPE {
            result = result.with_content_type(value);
        } else {
            result = result.with_header(name.as_str(), value);
        }
    }

    Ok(result)
}

/// Rebuilds a response from a [`NormalizedResult`].
#[must_use]
pub fn from_normalized(result: NormalizedResult) -> Response {
    let mut response = Response::new(Body::from(result.body));
    *response.status_mut() =
        StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let headers = response.headers_mut();
    for (name, value) in &result.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid stored header"),
        }
    }

    if let Some(content_type) = result
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::try_from(ct).ok())
    {
        headers.insert(CONTENT_TYPE, content_type);
    }

    response
}
