//! Versioned durable store for queued files and configuration.
//!
//! This module provides the single source of truth shared by the intercept
//! worker and the foreground reconciler: queued [`FileRecord`]s awaiting
//! upload, plus a small key/value configuration map. Records survive process
//! restarts and are removed only on explicit user action or a confirmed
//! upload.

mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::{FileRecord, SCHEMA_VERSION};
pub use store::VaultStore;
