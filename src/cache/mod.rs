//! Versioned cache generations for intercepted HTTP responses.
//!
//! A cache generation is one named snapshot of request URL -> response
//! pairs, created while a worker revision installs and superseded wholesale
//! when the revision changes. At most one generation is current; all others
//! are stale and deleted on activation. There is no size-based eviction.

mod error;
mod generation;
mod manager;

pub use error::CacheError;
pub use generation::{generation_name, CachedResponse};
pub use manager::CacheManager;
