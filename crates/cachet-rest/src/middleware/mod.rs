//! HTTP middleware.

mod cache;
mod identity;
mod logging;

pub use cache::*;
pub use identity::*;
pub use logging::*;
