//! Integration tests for the queue reconciler against a mock vault server.

#![cfg(feature = "server")]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tempfile::TempDir;

use common::spawn_upstream;
use filevault::reconcile::{CancelFlag, NullSink, ProgressSink, ReconcileError, Reconciler};
use filevault::store::VaultStore;

/// Mock upstream that accepts uploads, optionally failing the nth one.
#[derive(Clone)]
struct Upstream {
    calls: Arc<AtomicUsize>,
    fail_on: Option<usize>,
    /// Filenames received, in order.
    received: Arc<Mutex<Vec<String>>>,
}

impl Upstream {
    fn new(fail_on: Option<usize>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail_on,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/upload", post(upload))
            .with_state(self.clone())
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn received_names(&self) -> Vec<String> {
        self.received.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

async fn upload(State(upstream): State<Upstream>, mut multipart: Multipart) -> Response {
    let call = upstream.calls.fetch_add(1, Ordering::SeqCst) + 1;

    // Drain the form so the client's streamed body completes.
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("").to_string();
            let _ = field.bytes().await;
            if let Ok(mut received) = upstream.received.lock() {
                received.push(name);
            }
        }
    }

    if upstream.fail_on == Some(call) {
        return (
            StatusCode::INSUFFICIENT_STORAGE,
            Json(serde_json::json!({ "error": "disk full" })),
        )
            .into_response();
    }
    Json(serde_json::json!({ "ok": true })).into_response()
}

fn store_with_files(dir: &TempDir, names: &[&str]) -> anyhow::Result<Arc<VaultStore>> {
    let store = Arc::new(VaultStore::open(dir.path().join("store"))?);
    for name in names {
        store.put_file(name, "text/plain", format!("contents of {name}").into_bytes())?;
    }
    Ok(store)
}

#[tokio::test]
async fn full_pass_uploads_everything_and_empties_queue() -> anyhow::Result<()> {
    let upstream = Upstream::new(None);
    let addr = spawn_upstream(upstream.router()).await?;

    let dir = TempDir::new()?;
    let store = store_with_files(&dir, &["a.txt", "b.txt"])?;
    store.put_config("server_url", &format!("http://{addr}"))?;

    let reconciler = Reconciler::new(Arc::clone(&store));
    let report = reconciler
        .upload_all("", Arc::new(NullSink), &CancelFlag::new())
        .await?;

    assert_eq!(report.total, 2);
    assert_eq!(report.uploaded, 2);
    assert!(report.failed.is_none());
    assert_eq!(report.summary(), "2 of 2 uploaded");
    assert!(store.list_files()?.is_empty());
    assert_eq!(upstream.received_names(), vec!["a.txt", "b.txt"]);

    Ok(())
}

#[tokio::test]
async fn pass_halts_at_first_failure_keeping_unconfirmed_records() -> anyhow::Result<()> {
    let upstream = Upstream::new(Some(2));
    let addr = spawn_upstream(upstream.router()).await?;

    let dir = TempDir::new()?;
    let store = store_with_files(&dir, &["a.txt", "b.txt", "c.txt"])?;
    store.put_config("server_url", &format!("http://{addr}"))?;

    let reconciler = Reconciler::new(Arc::clone(&store));
    let report = reconciler
        .upload_all("", Arc::new(NullSink), &CancelFlag::new())
        .await?;

    assert_eq!(report.total, 3);
    assert_eq!(report.uploaded, 1);
    let failure = report.failed.ok_or_else(|| anyhow::anyhow!("expected a failure"))?;
    assert_eq!(failure.name, "b.txt");
    assert!(failure.reason.contains("disk full"));

    // Only the confirmed record left the queue; nothing past the failure
    // was attempted.
    let remaining: Vec<String> = store.list_files()?.into_iter().map(|r| r.name).collect();
    assert_eq!(remaining, vec!["b.txt", "c.txt"]);
    assert_eq!(upstream.call_count(), 2);

    Ok(())
}

#[tokio::test]
async fn missing_destination_fails_without_network() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store_with_files(&dir, &["a.txt"])?;

    let reconciler = Reconciler::new(Arc::clone(&store));
    let result = reconciler
        .upload_all("", Arc::new(NullSink), &CancelFlag::new())
        .await;

    assert!(matches!(result, Err(ReconcileError::ConfigMissing("server_url"))));
    assert_eq!(store.list_files()?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn blank_destination_counts_as_missing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = store_with_files(&dir, &[])?;
    store.put_config("server_url", "   ")?;

    let reconciler = Reconciler::new(Arc::clone(&store));
    assert!(matches!(
        reconciler.destination(),
        Err(ReconcileError::ConfigMissing("server_url"))
    ));

    Ok(())
}

#[tokio::test]
async fn cancelled_upload_keeps_record_queued() -> anyhow::Result<()> {
    let upstream = Upstream::new(None);
    let addr = spawn_upstream(upstream.router()).await?;

    let dir = TempDir::new()?;
    let store = store_with_files(&dir, &["a.txt"])?;
    store.put_config("server_url", &format!("http://{addr}"))?;

    let cancel = CancelFlag::new();
    cancel.cancel();

    let reconciler = Reconciler::new(Arc::clone(&store));
    let result = reconciler.upload_all("", Arc::new(NullSink), &cancel).await;

    assert!(matches!(result, Err(ReconcileError::Cancelled { .. })));
    assert_eq!(store.list_files()?.len(), 1);

    Ok(())
}

/// Sink that requests cancellation as soon as the first chunk is reported.
struct CancelOnFirstChunk {
    cancel: CancelFlag,
}

impl ProgressSink for CancelOnFirstChunk {
    fn on_progress(&self, _id: u64, _sent: u64, _total: u64) {
        self.cancel.cancel();
    }
}

#[tokio::test]
async fn cancelling_mid_transfer_aborts_and_keeps_record_queued() -> anyhow::Result<()> {
    let upstream = Upstream::new(None);
    let addr = spawn_upstream(upstream.router()).await?;

    let dir = TempDir::new()?;
    let store = Arc::new(VaultStore::open(dir.path().join("store"))?);
    // Several chunks, so the abort happens between chunk sends.
    store.put_file("big.bin", "application/octet-stream", vec![0u8; 256 * 1024])?;
    store.put_config("server_url", &format!("http://{addr}"))?;

    let cancel = CancelFlag::new();
    let sink = Arc::new(CancelOnFirstChunk {
        cancel: cancel.clone(),
    });

    let reconciler = Reconciler::new(Arc::clone(&store));
    let result = reconciler
        .upload_all("", sink as Arc<dyn ProgressSink>, &cancel)
        .await;

    assert!(matches!(result, Err(ReconcileError::Cancelled { .. })));
    // The aborted record stays queued for a later attempt.
    let remaining = store.list_files()?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(
        remaining.first().map(|r| r.name.as_str()),
        Some("big.bin")
    );

    Ok(())
}

/// Sink recording every progress callback for inspection.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(u64, u64, u64)>>,
    finished: Mutex<Vec<(u64, bool)>>,
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, id: u64, sent: u64, total: u64) {
        if let Ok(mut events) = self.events.lock() {
            events.push((id, sent, total));
        }
    }

    fn on_file_finished(&self, id: u64, success: bool) {
        if let Ok(mut finished) = self.finished.lock() {
            finished.push((id, success));
        }
    }
}

#[tokio::test]
async fn progress_is_reported_monotonically() -> anyhow::Result<()> {
    let upstream = Upstream::new(None);
    let addr = spawn_upstream(upstream.router()).await?;

    let dir = TempDir::new()?;
    let store = Arc::new(VaultStore::open(dir.path().join("store"))?);
    // Large enough to span several chunks.
    let id = store.put_file("big.bin", "application/octet-stream", vec![0u8; 200 * 1024])?;
    store.put_config("server_url", &format!("http://{addr}"))?;

    let sink = Arc::new(RecordingSink::default());
    let reconciler = Reconciler::new(Arc::clone(&store));
    let report = reconciler
        .upload_all("backups", Arc::clone(&sink) as Arc<dyn ProgressSink>, &CancelFlag::new())
        .await?;

    assert_eq!(report.uploaded, 1);
    let events = sink.events.lock().map(|e| e.clone()).unwrap_or_default();
    assert!(events.len() >= 2, "expected chunked progress, got {events:?}");
    let mut last = 0;
    for (event_id, sent, total) in &events {
        assert_eq!(*event_id, id);
        assert_eq!(*total, 200 * 1024);
        assert!(*sent >= last, "progress went backwards: {events:?}");
        last = *sent;
    }
    assert_eq!(
        sink.finished.lock().map(|f| f.clone()).unwrap_or_default(),
        vec![(id, true)]
    );

    Ok(())
}
