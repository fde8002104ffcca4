//! Error types for the intercept worker.

use thiserror::Error;

use crate::cache::CacheError;
use crate::store::StoreError;

use super::lifecycle::WorkerState;

/// Errors that can occur in the intercept worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// A required application-shell resource could not be fetched during
    /// install. The previous worker generation stays active.
    #[error("Install failed fetching '{url}': {reason}")]
    InstallFailed { url: String, reason: String },

    /// A lifecycle method was called out of order.
    #[error("Invalid lifecycle transition from {from:?} to {to:?}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    /// A share submission carried no extractable file parts, or extraction
    /// stopped partway. The submission is still answered with a redirect.
    #[error("Share extraction failed: {0}")]
    ShareExtractionFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
