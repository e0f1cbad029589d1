//! Result type aliases for Cachet.

use crate::CachetError;

/// A specialized `Result` type for Cachet operations.
pub type CachetResult<T> = Result<T, CachetError>;

