//! Share-target submission persistence.
//!
//! The HTTP layer extracts file parts from an intercepted multipart POST
//! and hands them here; every part becomes a durable [`FileRecord`] before
//! the submission is answered. The response is always a redirect to the
//! queue-review page; success or failure is carried in a query parameter,
//! never a dropped request.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::logging::{info, warn};
use crate::store::VaultStore;

use super::error::WorkerError;
use super::fetch::InterceptConfig;

/// One file part extracted from a share submission.
#[derive(Debug, Clone)]
pub struct SharedPart {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Result of persisting one share submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareOutcome {
    /// Ids of the records written, in submission order.
    pub ids: Vec<u64>,
}

impl ShareOutcome {
    pub fn saved(&self) -> usize {
        self.ids.len()
    }
}

/// Persist every extracted file part as a queued record.
///
/// An empty submission is [`WorkerError::ShareExtractionFailed`]. A store
/// failure partway also surfaces as an error; parts already written remain
/// queued (delivery is at-least-once, never silently dropped).
pub fn store_shared(store: &VaultStore, parts: Vec<SharedPart>) -> Result<ShareOutcome, WorkerError> {
    if parts.is_empty() {
        warn!("share submission carried no file parts");
        return Err(WorkerError::ShareExtractionFailed(
            "no file parts in submission".to_string(),
        ));
    }

    let mut ids = Vec::with_capacity(parts.len());
    for part in parts {
        let id = store.put_file(&part.name, &part.mime_type, part.bytes)?;
        ids.push(id);
    }

    info!(saved = ids.len(), "share submission queued");
    Ok(ShareOutcome { ids })
}

/// Build the post-share redirect target for the queue-review page.
///
/// Carries `saved=N` on success or `saved=error` on failure, plus a
/// timestamp so the redirect itself is never served from cache.
pub fn review_redirect(config: &InterceptConfig, outcome: &Result<ShareOutcome, WorkerError>) -> String {
    let saved = match outcome {
        Ok(outcome) => outcome.saved().to_string(),
        Err(_) => "error".to_string(),
    };
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}?saved={}&ts={}", config.review_path, saved, ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> VaultStore {
        VaultStore::open(dir.path().join("store")).unwrap()
    }

    fn part(name: &str, bytes: &[u8]) -> SharedPart {
        SharedPart {
            name: name.to_string(),
            mime_type: "application/octet-stream".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn every_part_becomes_a_record() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let outcome =
            store_shared(&store, vec![part("photo.jpg", &[0u8; 64]), part("note.txt", b"hi")])
                .unwrap();
        assert_eq!(outcome.saved(), 2);

        let records = store.list_files().unwrap();
        assert_eq!(records.len(), 2);
        let first = records.first().unwrap();
        assert_eq!(first.name, "photo.jpg");
        assert_eq!(first.size, 64);
        let second = records.get(1).unwrap();
        assert_eq!(second.name, "note.txt");
        assert_eq!(second.size, 2);
    }

    #[test]
    fn empty_submission_is_extraction_failure() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let outcome = store_shared(&store, Vec::new());
        assert!(matches!(outcome, Err(WorkerError::ShareExtractionFailed(_))));
        assert!(store.list_files().unwrap().is_empty());
    }

    #[test]
    fn redirect_carries_count_or_error() {
        let config = InterceptConfig::default();
        let ok: Result<ShareOutcome, WorkerError> = Ok(ShareOutcome { ids: vec![1, 2] });
        let err: Result<ShareOutcome, WorkerError> =
            Err(WorkerError::ShareExtractionFailed("empty".to_string()));

        assert!(review_redirect(&config, &ok).starts_with("/static/share.html?saved=2&ts="));
        assert!(review_redirect(&config, &err).starts_with("/static/share.html?saved=error&ts="));
    }
}
