//! Unified error type for the filevault library.
//!
//! This module provides a single [`Error`] type that encompasses all errors
//! that can occur in the library, making it easier to handle errors in
//! application code.

use thiserror::Error;

#[cfg(feature = "worker")]
use crate::cache::CacheError;
#[cfg(feature = "reconcile")]
use crate::reconcile::ReconcileError;
#[cfg(feature = "store")]
use crate::store::StoreError;
#[cfg(feature = "worker")]
use crate::worker::WorkerError;

/// Unified error type for all filevault operations.
///
/// This enum wraps all subsystem-specific error types, allowing callers to
/// use a single error type throughout their application.
///
/// # Example
///
/// ```ignore
/// use filevault::{Result, VaultStore};
///
/// fn queue(payload: Vec<u8>) -> Result<u64> {
///     let store = VaultStore::open(".filevault/store")?;
///     let id = store.put_file("note.txt", "text/plain", payload)?;
///     Ok(id)
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the durable store.
    #[cfg(feature = "store")]
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Error from cache-generation management.
    #[cfg(feature = "worker")]
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Error from the intercept worker.
    #[cfg(feature = "worker")]
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// Error from queue reconciliation.
    #[cfg(feature = "reconcile")]
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a durable-store error.
    #[cfg(feature = "store")]
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns `true` if this is a cache error.
    #[cfg(feature = "worker")]
    pub fn is_cache(&self) -> bool {
        matches!(self, Self::Cache(_))
    }

    /// Returns `true` if this is a reconciliation error.
    #[cfg(feature = "reconcile")]
    pub fn is_reconcile(&self) -> bool {
        matches!(self, Self::Reconcile(_))
    }
}
