//! Unified error types for Cachet.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all Cachet crates.
///
/// Handler errors are never wrapped in this type: the caching wrapper is
/// generic over the handler's own error and only converts its own failures.
#[derive(Error, Debug)]
pub enum CachetError {
    // ============ Programmer / Configuration Errors ============
    /// Invalid argument passed to key construction or invalidation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation needs an authenticated principal
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ============ Infrastructure Errors ============
    /// Redis/Cache store error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Stored payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CachetError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Cache(_) => 503,
            Self::Configuration(_)
            | Self::Serialization(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input<T: Into<String>>(message: T) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a cache store error.
    #[must_use]
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for CachetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `CachetError`.
    #[must_use]
    pub fn from_error(error: &CachetError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(CachetError::invalid_input("bad model").status_code(), 400);
        assert_eq!(CachetError::unauthorized("anonymous").status_code(), 401);
        assert_eq!(CachetError::not_found("widget 3").status_code(), 404);
        assert_eq!(CachetError::cache("down").status_code(), 503);
        assert_eq!(CachetError::internal("oops").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CachetError::invalid_input("x").error_code(), "INVALID_INPUT");
        assert_eq!(CachetError::unauthorized("x").error_code(), "UNAUTHORIZED");
        assert_eq!(CachetError::cache("x").error_code(), "CACHE_ERROR");
        assert_eq!(
            CachetError::Configuration("x".to_string()).error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(CachetError::internal("x").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: CachetError = err.into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_error_response_from_error() {
        let err = CachetError::invalid_input("not a user");
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "INVALID_INPUT");
        assert!(response.message.contains("not a user"));
    }
}
