//! JSON envelope, error rendering and conversion to and from normalized results.

mod normalized;

pub use normalized::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cachet_core::{CachetError, ErrorResponse};
use serde::{Deserialize, Serialize};

/// Envelope for JSON bodies that are not a bare resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// Error returned from handlers and middleware.
///
/// The status follows [`CachetError::status_code`] unless overridden with
/// [`AppError::server`].
#[derive(Debug)]
pub struct AppError {
    error: CachetError,
    status: StatusCode,
}

impl AppError {
    /// Renders `error` as a 500 whatever its kind.
    ///
    /// For failures caused by how a route was set up rather than by what the
    /// client sent, such as a handler declaring a malformed dependency.
    #[must_use]
    pub fn server(error: CachetError) -> Self {
        Self {
            error,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CachetError> for AppError {
    fn from(error: CachetError) -> Self {
        let status = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { error, status }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ErrorResponse::from_error(&self.error)),
        };
        (self.status, Json(body)).into_response()
    }
}

/// Result type for handlers answering with an envelope.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Wraps `data` in a successful envelope.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: CachetError) -> StatusCode {
        AppError::from(error).into_response().status()
    }

    #[test]
    fn test_client_errors_keep_their_status() {
        assert_eq!(status_of(CachetError::invalid_input("empty pattern")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CachetError::not_found("widget 3")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(CachetError::unauthorized("no user")), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(CachetError::cache("down")), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_server_override_is_500() {
        let error = AppError::server(CachetError::invalid_input("bad dependency"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
