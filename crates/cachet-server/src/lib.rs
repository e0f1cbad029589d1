//! # Cachet Server Library
//!
//! Dependency injection wiring and startup utilities for the demo server.

pub mod di;
pub mod startup;
