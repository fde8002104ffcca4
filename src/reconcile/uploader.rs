//! Sequential multipart uploads of queued records.

use std::io;
use std::sync::Arc;

use futures::StreamExt;

use crate::logging::{debug, error, info, warn};
use crate::store::{FileRecord, VaultStore};

use super::error::{ReconcileError, UploadFailure};
use super::progress::{CancelFlag, ProgressSink};

/// Config key naming the remote destination base URL.
const DEST_CONFIG_KEY: &str = "server_url";

/// Payload chunk size for progress reporting.
const CHUNK_SIZE: usize = 64 * 1024;

/// Outcome of one reconciliation pass: how many of the queued records were
/// confirmed uploaded before the pass ended.
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Records queued when the pass started.
    pub total: usize,
    /// Records confirmed uploaded and removed from the queue.
    pub uploaded: usize,
    /// The failure that halted the pass, if any.
    pub failed: Option<UploadFailure>,
}

impl UploadReport {
    /// User-facing summary, e.g. "2 of 2 uploaded".
    pub fn summary(&self) -> String {
        format!("{} of {} uploaded", self.uploaded, self.total)
    }
}

/// Foreground logic that turns queued records into confirmed remote uploads.
///
/// Uploads run sequentially, one at a time, stopping at the first failure,
/// so constrained mobile uplinks are not saturated and progress reporting
/// stays comprehensible. A record is deleted from the store
/// only after the server confirms its upload with a 2xx response.
pub struct Reconciler {
    store: Arc<VaultStore>,
    client: reqwest::Client,
}

impl Reconciler {
    pub fn new(store: Arc<VaultStore>) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
        }
    }

    /// Use a caller-provided HTTP client (custom timeouts, proxies).
    pub fn with_client(store: Arc<VaultStore>, client: reqwest::Client) -> Self {
        Self { store, client }
    }

    /// Snapshot of the queued records, straight from the store.
    pub fn list_queued(&self) -> Result<Vec<FileRecord>, ReconcileError> {
        Ok(self.store.list_files()?)
    }

    /// Resolve the configured destination base URL.
    ///
    /// Missing or empty configuration is [`ReconcileError::ConfigMissing`];
    /// no network I/O happens in that case.
    pub fn destination(&self) -> Result<String, ReconcileError> {
        match self.store.get_config(DEST_CONFIG_KEY)? {
            Some(url) if !url.trim().is_empty() => Ok(url.trim().to_string()),
            _ => {
                warn!(key = DEST_CONFIG_KEY, "reconciliation requested without a destination");
                Err(ReconcileError::ConfigMissing(DEST_CONFIG_KEY))
            }
        }
    }

    /// Upload one record as `multipart/form-data` to
    /// `{destination}/api/upload`.
    ///
    /// The payload streams in chunks, reporting monotonically non-decreasing
    /// progress to `sink` and honoring `cancel` at chunk boundaries. The
    /// record itself is not touched here; deletion on success is the
    /// caller's responsibility, after this returns `Ok`.
    pub async fn upload_one(
        &self,
        record: &FileRecord,
        destination: &str,
        dest_dir: &str,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancelFlag,
    ) -> Result<(), ReconcileError> {
        let payload = self.store.load_payload(record.id)?;
        let total = payload.len() as u64;

        sink.on_file_started(record.id, &record.name);
        debug!(id = record.id, name = %record.name, bytes = total, "starting upload");

        let body = progress_body(payload, record.id, total, Arc::clone(&sink), cancel.clone());
        let mime = if record.mime_type.is_empty() {
            "application/octet-stream"
        } else {
            record.mime_type.as_str()
        };
        let part = reqwest::multipart::Part::stream_with_length(body, total)
            .file_name(record.name.clone())
            .mime_str(mime)
            .map_err(|e| self.failure(record, format!("invalid content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("dest", dest_dir.to_string())
            .part("file", part);

        let url = format!("{}/api/upload", destination.trim_end_matches('/'));
        let response = match self.client.post(&url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                sink.on_file_finished(record.id, false);
                if cancel.is_cancelled() {
                    info!(id = record.id, "upload cancelled, record stays queued");
                    return Err(ReconcileError::Cancelled {
                        id: record.id,
                        name: record.name.clone(),
                    });
                }
                error!(id = record.id, error = %e, "upload transport error");
                return Err(self.failure(record, e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            sink.on_file_finished(record.id, true);
            info!(id = record.id, name = %record.name, "upload confirmed");
            return Ok(());
        }

        // Prefer the server's JSON error body when it has one.
        let reason = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("error")
                .and_then(|e| e.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(_) => format!("HTTP {}", status),
        };
        sink.on_file_finished(record.id, false);
        error!(id = record.id, status = %status, reason = %reason, "upload rejected");
        Err(self.failure(record, reason))
    }

    /// Upload every queued record sequentially, stopping at the first
    /// failure.
    ///
    /// Records are deleted only after their individual 2xx confirmation, so
    /// a pass that fails partway leaves exactly the unconfirmed records
    /// queued for a future retry. Returns the pass report either way;
    /// cancellation and store errors propagate as errors.
    pub async fn upload_all(
        &self,
        dest_dir: &str,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancelFlag,
    ) -> Result<UploadReport, ReconcileError> {
        let destination = self.destination()?;
        let queued = self.list_queued()?;
        let total = queued.len();
        info!(total = total, destination = %destination, "reconciliation pass started");

        let mut uploaded = 0;
        for record in &queued {
            match self
                .upload_one(record, &destination, dest_dir, Arc::clone(&sink), cancel)
                .await
            {
                Ok(()) => {
                    // Confirmed; only now does the record leave the queue.
                    self.store.delete_file(record.id)?;
                    uploaded += 1;
                }
                Err(ReconcileError::UploadFailed(failure)) => {
                    warn!(uploaded = uploaded, total = total, "pass halted at first failure");
                    return Ok(UploadReport {
                        total,
                        uploaded,
                        failed: Some(failure),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        info!(uploaded = uploaded, total = total, "reconciliation pass complete");
        Ok(UploadReport {
            total,
            uploaded,
            failed: None,
        })
    }

    fn failure(&self, record: &FileRecord, reason: String) -> ReconcileError {
        ReconcileError::UploadFailed(UploadFailure {
            id: record.id,
            name: record.name.clone(),
            reason,
        })
    }
}

/// Wrap a payload into a chunked request body that reports progress and
/// honors cancellation between chunks.
fn progress_body(
    payload: Vec<u8>,
    id: u64,
    total: u64,
    sink: Arc<dyn ProgressSink>,
    cancel: CancelFlag,
) -> reqwest::Body {
    let chunks: Vec<Vec<u8>> = payload.chunks(CHUNK_SIZE).map(|c| c.to_vec()).collect();
    let mut sent: u64 = 0;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        if cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "upload cancelled"));
        }
        sent += chunk.len() as u64;
        sink.on_progress(id, sent, total);
        Ok(chunk)
    });
    reqwest::Body::wrap_stream(stream)
}
