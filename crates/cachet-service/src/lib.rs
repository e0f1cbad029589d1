//! # Cachet Service
//!
//! Response-level caching for request handlers.
//!
//! - [`keys`] builds deterministic cache keys from a handler identity and
//!   the request facets it varies on.
//! - [`CacheWrapper`] serves stored responses or runs the handler and
//!   stores what it returns.
//! - [`InvalidationService`] deletes entries by embedded key fragment.
//! - [`MutationListener`] invalidates on model saves and deletes.

pub mod cache;
pub mod invalidation;
pub mod keys;
pub mod listener;
mod normalized;
mod options;
mod request;
mod wrapper;

pub use cache::*;
pub use invalidation::{InvalidationService, InvalidationServiceComponent};
pub use keys::{
    add_language, add_method, add_model_dependencies, add_query_params, add_user,
    escape_param_name, escape_value, get_base_key, get_model_fragment, get_user_fragment,
    CacheKey, HandlerIdentity, KeyBuilder, KEY_DELIMITER,
};
pub use listener::{ModelChanged, MutationKind, MutationListener};
pub use normalized::NormalizedResult;
pub use options::{CacheOptions, DEFAULT_INSTANCE_ID_PARAM, DEFAULT_TTL};
pub use request::RequestContext;
pub use wrapper::{CacheOutcome, CacheStatus, CacheWrapper};
