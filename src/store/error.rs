//! Error types for the durable store.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying storage could not be opened at all (directory missing
    /// permissions, disabled platform storage, exhausted quota).
    #[error("Offline storage unavailable at {path}: {reason}")]
    Unavailable { path: String, reason: String },

    /// A write could not be completed; no partial mutation is visible.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A read could not be completed, including payload checksum mismatches.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// The on-disk schema version is newer than this build understands.
    #[error("Store schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    /// Stored bytes did not decode as a valid record or meta entry.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),
}

impl StoreError {
    /// Returns `true` for errors worth an explicit caller retry (transient
    /// I/O), as opposed to storage being unusable altogether.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::WriteFailed(_) | Self::ReadFailed(_) | Self::Io(_))
    }
}
