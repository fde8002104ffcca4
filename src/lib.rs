//! # filevault
//!
//! Offline share-queue and synchronization core for a personal file vault.
//!
//! Files handed to the vault through the OS share sheet are persisted into a
//! local durable store while the remote vault server is unreachable, and
//! reconciled (uploaded, then removed on confirmed success) once connectivity
//! returns. The crate is split into four subsystems:
//!
//! - [`store`] - versioned durable store for queued file records and
//!   configuration entries, backed by fjall (requires `store` feature)
//! - [`cache`] - named, versioned collections of cached HTTP responses with
//!   generation-based garbage collection (requires `worker` feature)
//! - [`worker`] - the intercept-worker core: install/activate lifecycle,
//!   fetch classification, share-payload persistence (requires `worker`
//!   feature)
//! - [`reconcile`] - sequential multipart upload of queued records with
//!   progress reporting and cooperative cancellation (requires `reconcile`
//!   feature)
//!
//! # Quick Start
//!
//! ```ignore
//! use filevault::prelude::*;
//!
//! let store = VaultStore::open(".filevault/store")?;
//! let id = store.put_file("photo.jpg", "image/jpeg", payload)?;
//! for record in store.list_files()? {
//!     println!("{} ({} bytes)", record.name, record.size);
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `store` - durable queue/config store (enabled by default)
//! - `worker` - intercept-worker core (enabled by default)
//! - `reconcile` - queue reconciler over HTTP
//! - `logging` - library-level tracing (consumers provide their own subscriber)
//! - `server` - HTTP intercept server and caching gateway
//! - `full` - everything

#[cfg(feature = "worker")]
pub mod cache;
#[cfg(feature = "store")]
mod logging;
pub mod prelude;
#[cfg(feature = "reconcile")]
pub mod reconcile;
#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "store")]
pub mod store;
#[cfg(feature = "worker")]
pub mod worker;

mod error;

// Re-export the unified error type
pub use error::{Error, Result};

// Re-export store types at crate root for convenience
#[cfg(feature = "store")]
pub use store::{FileRecord, StoreError, VaultStore, SCHEMA_VERSION};

// Re-export cache types
#[cfg(feature = "worker")]
pub use cache::{CacheError, CacheManager, CachedResponse};

// Re-export worker types
#[cfg(feature = "worker")]
pub use worker::{
    FetchClass, FetchPolicy, InterceptConfig, InterceptWorker, ShareOutcome, SharedPart,
    WorkerError, WorkerState,
};

// Re-export reconciler types
#[cfg(feature = "reconcile")]
pub use reconcile::{
    CancelFlag, NullSink, ProgressSink, ReconcileError, Reconciler, UploadFailure, UploadReport,
};
