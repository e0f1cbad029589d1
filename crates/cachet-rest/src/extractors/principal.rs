//! Principal extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use cachet_core::Principal;

/// The principal attached by the identity middleware.
///
/// Anonymous when no identity was established; never rejects.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl std::ops::Deref for CurrentPrincipal {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts.extensions.get::<Principal>().cloned().unwrap_or_default();
        Ok(CurrentPrincipal(principal))
    }
}
