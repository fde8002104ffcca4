//! Queue inspection, deletion, and synchronization handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::reconcile::{CancelFlag, NullSink};
use crate::store::FileRecord;

use super::super::error::ApiError;
use super::super::state::AppState;

/// One queued record, as returned by the queue listing.
#[derive(Debug, Serialize)]
pub struct QueueEntry {
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub created_at_ms: u64,
}

impl From<FileRecord> for QueueEntry {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            size: record.size,
            mime_type: record.mime_type,
            created_at_ms: record.created_at_ms,
        }
    }
}

/// GET /api/queue: list queued records, oldest first.
pub async fn list_queue(State(state): State<AppState>) -> Result<Json<Vec<QueueEntry>>, ApiError> {
    let records = state.store.list_files()?;
    Ok(Json(records.into_iter().map(QueueEntry::from).collect()))
}

/// DELETE /api/queue/{id}: drop one queued record.
pub async fn delete_queued(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_file(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/queue: drop every queued record.
pub async fn clear_queue(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.clear_files()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Optional body for POST /api/queue/sync.
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Remote directory to upload into. Defaults to the destination root.
    #[serde(default)]
    pub dest: String,
}

/// Result of a sync pass.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub ok: bool,
    pub total: usize,
    pub uploaded: usize,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/queue/sync: run one reconciliation pass.
///
/// Uploads stop at the first failure; the response reports how far the pass
/// got either way. A missing destination is rejected before any network I/O.
pub async fn sync_queue(
    State(state): State<AppState>,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<SyncResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let cancel = CancelFlag::new();

    let report = state
        .reconciler
        .upload_all(&request.dest, Arc::new(NullSink), &cancel)
        .await?;

    let summary = report.summary();
    Ok(Json(SyncResponse {
        ok: report.failed.is_none(),
        total: report.total,
        uploaded: report.uploaded,
        summary,
        error: report.failed.map(|f| f.to_string()),
    }))
}
