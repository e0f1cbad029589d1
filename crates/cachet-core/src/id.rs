//! Principal identities as seen by the cache key schema.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use uuid::Uuid;

/// A strongly-typed wrapper for user IDs.
///
/// Stored as text so that integer primary keys, UUIDs and slugs all render
/// the same way inside a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Creates a user ID from any displayable identifier.
    #[must_use]
    pub fn new(id: impl Display) -> Self {
        Self(id.to_string())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The caller on whose behalf a request runs.
///
/// The authentication subsystem decides who is authenticated; the cache
/// only cares whether there is a user identity to scope entries by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Principal {
    /// Unauthenticated caller. All anonymous callers share one bucket.
    #[default]
    Anonymous,
    /// Authenticated user.
    User(UserId),
}

impl Principal {
    /// Creates an authenticated principal.
    #[must_use]
    pub fn user(id: impl Into<UserId>) -> Self {
        Self::User(id.into())
    }

    /// Returns true for unauthenticated callers.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Returns the user ID of an authenticated principal.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::User(id) => Some(id),
            Self::Anonymous => None,
        }
    }
}

impl From<UserId> for Principal {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}
