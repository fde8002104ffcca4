//! Convenient re-exports for common usage patterns.
//!
//! This module provides a single import to bring all commonly used types
//! into scope.
//!
//! # Example
//!
//! ```ignore
//! use filevault::prelude::*;
//!
//! let store = VaultStore::open(".filevault/store")?;
//! let id = store.put_file("note.txt", "text/plain", b"hello".to_vec())?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Durable store types (requires "store" feature)
#[cfg(feature = "store")]
pub use crate::store::{FileRecord, StoreError, VaultStore, SCHEMA_VERSION};

// Cache and worker types (requires "worker" feature)
#[cfg(feature = "worker")]
pub use crate::cache::{generation_name, CacheError, CacheManager, CachedResponse};
#[cfg(feature = "worker")]
pub use crate::worker::{
    classify, review_redirect, store_shared, FetchClass, FetchPolicy, InterceptConfig,
    InterceptWorker, ShareOutcome, SharedPart, WorkerError, WorkerState,
};

// Reconciler types (requires "reconcile" feature)
#[cfg(feature = "reconcile")]
pub use crate::reconcile::{
    CancelFlag, NullSink, ProgressSink, ReconcileError, Reconciler, UploadFailure, UploadReport,
};
