//! Queue reconciliation: uploading queued records to the remote vault.
//!
//! The reconciler re-reads the queue from the durable store (no in-memory
//! copy is authoritative), uploads records one at a time to the configured
//! destination, and deletes each record only after its upload is confirmed
//! with a 2xx response. The batch stops at the first failure; the user
//! re-triggers reconciliation explicitly, so there is no retry storm.

mod error;
mod progress;
mod uploader;

pub use error::{ReconcileError, UploadFailure};
pub use progress::{CancelFlag, NullSink, ProgressSink};
pub use uploader::{Reconciler, UploadReport};
