//! Custom Axum extractors.

mod principal;
mod request_context;

pub use principal::*;
pub use request_context::*;
