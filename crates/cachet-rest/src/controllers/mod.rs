//! REST API controllers.

pub mod cache_controller;
pub mod health_controller;
pub mod profile_controller;
pub mod widget_controller;

pub use health_controller::*;
