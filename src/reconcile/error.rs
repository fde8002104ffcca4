//! Error types for queue reconciliation.

use thiserror::Error;

use crate::store::StoreError;

/// Details of one failed upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    /// Record id of the file that failed.
    pub id: u64,
    /// Original filename, for user-facing reporting.
    pub name: String,
    /// Server-provided error message when available, otherwise the
    /// transport error.
    pub reason: String,
}

impl std::fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upload of '{}' (record {}) failed: {}", self.name, self.id, self.reason)
    }
}

/// Errors that can occur during reconciliation.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The destination URL is not configured; surfaced before any network
    /// I/O is attempted.
    #[error("Destination not configured: config key '{0}' is unset or empty")]
    ConfigMissing(&'static str),

    /// Network error or non-2xx response for one file. The record stays
    /// queued and the remaining batch is halted.
    #[error("{0}")]
    UploadFailed(UploadFailure),

    /// The user cancelled the in-flight transfer. The record stays queued.
    #[error("Upload of '{name}' (record {id}) cancelled")]
    Cancelled { id: u64, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
