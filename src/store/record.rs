//! Record types and on-disk metadata codec.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::StoreError;

/// Current store schema version (2).
///
/// Version 1 carried only the `files` keyspace; version 2 added the `config`
/// keyspace. Upgrades are additive: opening an older store creates the
/// missing keyspaces and bumps the version without touching existing
/// records. Opening a store written by a newer build is rejected.
pub const SCHEMA_VERSION: u32 = 2;

/// One queued file awaiting upload.
///
/// Metadata is immutable after creation; the record is destroyed when the
/// user removes it or the reconciler confirms its remote upload. The payload
/// blob lives under a side key and is loaded separately via
/// [`VaultStore::load_payload`](super::VaultStore::load_payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Store-assigned id, unique for the lifetime of the store.
    pub id: u64,
    /// Original filename.
    pub name: String,
    /// Payload length in bytes.
    pub size: u64,
    /// Best-effort content type.
    pub mime_type: String,
    /// Insertion time, unix epoch milliseconds.
    pub created_at_ms: u64,
    /// CRC32 of the payload, verified on read.
    pub checksum: u32,
}

impl FileRecord {
    /// Build a record for a freshly received payload.
    pub fn new(id: u64, name: &str, mime_type: &str, payload: &[u8]) -> Self {
        Self {
            id,
            name: name.to_string(),
            size: payload.len() as u64,
            mime_type: mime_type.to_string(),
            created_at_ms: now_ms(),
            checksum: crc32fast::hash(payload),
        }
    }

    /// Encode the metadata for storage.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(|e| StoreError::InvalidFormat(e.to_string()))
    }

    /// Decode metadata read back from storage.
    pub fn decode(buffer: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(buffer).map_err(|e| StoreError::InvalidFormat(e.to_string()))
    }

    /// Verify a payload against the stored checksum and length.
    pub fn verify_payload(&self, payload: &[u8]) -> Result<(), StoreError> {
        if payload.len() as u64 != self.size {
            return Err(StoreError::ReadFailed(format!(
                "payload for record {} is {} bytes, expected {}",
                self.id,
                payload.len(),
                self.size
            )));
        }
        let actual = crc32fast::hash(payload);
        if actual != self.checksum {
            return Err(StoreError::ReadFailed(format!(
                "payload checksum mismatch for record {}",
                self.id
            )));
        }
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let record = FileRecord::new(7, "photo.jpg", "image/jpeg", b"abc");
        let bytes = record.encode().unwrap();
        let decoded = FileRecord::decode(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.size, 3);
    }

    #[test]
    fn verify_detects_corruption() {
        let record = FileRecord::new(1, "note.txt", "text/plain", b"hello");
        assert!(record.verify_payload(b"hello").is_ok());
        assert!(record.verify_payload(b"hellO").is_err());
        assert!(record.verify_payload(b"hell").is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(FileRecord::decode(b"not json").is_err());
    }
}
