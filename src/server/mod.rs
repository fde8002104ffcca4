//! HTTP surface for the intercept worker and reconciler.
//!
//! This module exposes the share-target intercept endpoint, the queue and
//! configuration management API, and the caching gateway that applies the
//! worker's fetch policies to an upstream vault server, all as one axum
//! application.

mod config;
mod error;
mod logging;
mod routes;
mod state;

pub use config::{Config, LogFormat, LoggingConfig, ServerConfig, StoreConfig, UpstreamConfig, WorkerConfig};
pub use error::ApiError;
pub use logging::init as init_logging;
pub use routes::router;
pub use state::AppState;
