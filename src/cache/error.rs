//! Error types for cache-generation management.

use thiserror::Error;

/// Errors that can occur while managing cache generations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache database could not be opened.
    #[error("Cache storage unavailable at {path}: {reason}")]
    Unavailable { path: String, reason: String },

    /// The named generation is not registered.
    #[error("Cache generation not found: {0}")]
    GenerationNotFound(String),

    /// The named generation is the committed one and must not be staged or
    /// discarded; a new revision needs a new name.
    #[error("Cache generation '{0}' is current and cannot be replaced in place")]
    GenerationActive(String),

    /// Stored bytes did not decode as a cached response or registry entry.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),
}
