//! # Cachet REST
//!
//! Axum integration for response caching: request context extraction,
//! response normalization, a per-route caching layer, and a small widget
//! API that exercises caching and invalidation end to end.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod repository;
pub mod responses;
pub mod router;
pub mod state;

pub use middleware::{ResponseCache, X_CACHE};
pub use router::*;
pub use state::*;
