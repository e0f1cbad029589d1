//! # Cachet Core
//!
//! Core types, identities, and error definitions for Cachet.
//! This crate provides the foundational abstractions shared by the key
//! builder, the cache gateway and the HTTP boundary.

pub mod error;
pub mod id;
pub mod model;
pub mod result;
pub mod telemetry;
pub mod traits;

pub use error::*;
pub use id::*;
pub use model::*;
pub use result::*;
pub use traits::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
