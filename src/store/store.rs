//! Durable store implementation using fjall.

use std::path::Path;
use std::sync::Mutex;

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};

use crate::logging::{debug, error, info, trace, warn};

use super::error::StoreError;
use super::record::{FileRecord, SCHEMA_VERSION};

/// Keyspace holding queued file records.
const FILES_KEYSPACE: &str = "files";
/// Keyspace holding configuration entries.
const CONFIG_KEYSPACE: &str = "config";
/// Internal metadata keyspace.
const META_KEYSPACE: &str = "_meta";

/// Meta keys.
const META_SCHEMA_KEY: &str = "schema";
const META_NEXT_ID_KEY: &str = "files/next_id";

/// Side-key suffix for payload blobs.
const PAYLOAD_SUFFIX: &str = ".payload";

/// The durable store shared by the intercept worker and the foreground page.
///
/// `VaultStore` persists queued [`FileRecord`]s and string configuration
/// entries in a fjall keyspace database. All mutations are durably persisted
/// before returning, and mutations are serialized under an internal lock so
/// concurrent callers (worker task and page task) observe each operation as
/// atomic.
///
/// # Example
///
/// ```ignore
/// use filevault::VaultStore;
///
/// let store = VaultStore::open(".filevault/store")?;
/// let id = store.put_file("note.txt", "text/plain", b"hello".to_vec())?;
/// assert_eq!(store.list_files()?.len(), 1);
/// store.delete_file(id)?;
/// ```
///
/// # Schema versioning
///
/// The on-disk schema version is stored in the `_meta` keyspace and only
/// ever increases. [`open`](Self::open) upgrades older stores additively
/// (creating missing keyspaces) and rejects stores written by newer builds.
pub struct VaultStore {
    db: fjall::Database,
    meta: Keyspace,
    // Serializes id assignment and multi-key mutations.
    write_lock: Mutex<()>,
}

impl VaultStore {
    /// Open the store at `path`, creating and upgrading it as necessary.
    ///
    /// Safe to call from multiple tasks; all callers should share the
    /// returned handle (it is the one live connection). Fails with
    /// [`StoreError::Unavailable`] when the underlying storage cannot be
    /// used at all.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening vault store");

        let db = fjall::Database::builder(path).open().map_err(|e| {
            error!(path = %path.display(), error = %e, "storage unavailable");
            StoreError::Unavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        let meta = db.keyspace(META_KEYSPACE, KeyspaceCreateOptions::default)?;
        let _ = db.keyspace(FILES_KEYSPACE, KeyspaceCreateOptions::default)?;

        match Self::read_schema_version(&meta)? {
            None => {
                // Fresh store: create everything at the current version.
                let _ = db.keyspace(CONFIG_KEYSPACE, KeyspaceCreateOptions::default)?;
                meta.insert(META_SCHEMA_KEY, SCHEMA_VERSION.to_le_bytes())?;
                db.persist(PersistMode::SyncAll)?;
                info!(path = %path.display(), version = SCHEMA_VERSION, "vault store initialized");
            }
            Some(found) if found > SCHEMA_VERSION => {
                error!(found = found, supported = SCHEMA_VERSION, "store schema too new");
                return Err(StoreError::SchemaTooNew {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
            Some(found) if found < SCHEMA_VERSION => {
                Self::upgrade(&db, &meta, found)?;
                info!(
                    path = %path.display(),
                    from = found,
                    to = SCHEMA_VERSION,
                    "vault store upgraded"
                );
            }
            Some(version) => {
                trace!(version = version, "store schema current");
            }
        }

        info!(path = %path.display(), "vault store opened");
        Ok(Self {
            db,
            meta,
            write_lock: Mutex::new(()),
        })
    }

    /// Apply additive upgrade steps from `from` up to [`SCHEMA_VERSION`].
    ///
    /// Each step only creates missing keyspaces; existing records are never
    /// touched, so re-running on an already-upgraded store is a no-op.
    fn upgrade(db: &fjall::Database, meta: &Keyspace, from: u32) -> Result<(), StoreError> {
        let mut version = from;
        while version < SCHEMA_VERSION {
            match version {
                // v1 -> v2: add the config keyspace.
                1 => {
                    let _ = db.keyspace(CONFIG_KEYSPACE, KeyspaceCreateOptions::default)?;
                }
                other => {
                    warn!(version = other, "no upgrade step for schema version");
                }
            }
            version += 1;
        }
        meta.insert(META_SCHEMA_KEY, SCHEMA_VERSION.to_le_bytes())?;
        db.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    fn read_schema_version(meta: &Keyspace) -> Result<Option<u32>, StoreError> {
        let Some(raw) = meta.get(META_SCHEMA_KEY)? else {
            return Ok(None);
        };
        let bytes: [u8; 4] = raw
            .as_ref()
            .try_into()
            .map_err(|_| StoreError::InvalidFormat("invalid schema version entry".to_string()))?;
        Ok(Some(u32::from_le_bytes(bytes)))
    }

    /// The schema version currently on disk.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        Ok(Self::read_schema_version(&self.meta)?.unwrap_or(SCHEMA_VERSION))
    }

    // File records

    /// Insert a queued file and return its store-assigned id.
    ///
    /// Ids are assigned monotonically and never reused within a store
    /// lifetime.
    pub fn put_file(
        &self,
        name: &str,
        mime_type: &str,
        payload: Vec<u8>,
    ) -> Result<u64, StoreError> {
        let _guard = self.lock_writes()?;

        let id = self.peek_next_id()?;
        let record = FileRecord::new(id, name, mime_type, &payload);
        let key = record_key(id);
        let files = self.files_keyspace()?;

        // Payload before metadata: an orphaned side key from an interrupted
        // insert is invisible to listing, but a record without its payload
        // would be a permanently unreadable queue entry.
        files
            .insert(payload_key(&key), payload)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        files
            .insert(&key, record.encode()?)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        self.meta
            .insert(META_NEXT_ID_KEY, (id + 1).to_le_bytes())
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        self.db
            .persist(PersistMode::SyncAll)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        debug!(id = id, name = name, size = record.size, "file queued");
        Ok(id)
    }

    /// Snapshot of all queued records in insertion order (metadata only).
    ///
    /// Concurrent inserts during iteration are not guaranteed to appear.
    pub fn list_files(&self) -> Result<Vec<FileRecord>, StoreError> {
        let files = self.files_keyspace()?;
        let mut records = Vec::new();

        for key in Self::record_keys(&files)? {
            let Some(raw) = files
                .get(&key)
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            else {
                continue;
            };
            records.push(FileRecord::decode(raw.as_ref())?);
        }

        trace!(count = records.len(), "listed queued files");
        Ok(records)
    }

    /// Load one record's payload, verifying length and checksum.
    pub fn load_payload(&self, id: u64) -> Result<Vec<u8>, StoreError> {
        let files = self.files_keyspace()?;
        let key = record_key(id);

        let record = files
            .get(&key)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .ok_or_else(|| StoreError::ReadFailed(format!("record {} not found", id)))?;
        let record = FileRecord::decode(record.as_ref())?;

        let payload = files
            .get(payload_key(&key))
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .ok_or_else(|| StoreError::ReadFailed(format!("payload for record {} missing", id)))?
            .to_vec();

        record.verify_payload(&payload)?;
        Ok(payload)
    }

    /// Remove one queued record. A missing id is a no-op, not an error.
    pub fn delete_file(&self, id: u64) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;

        let files = self.files_keyspace()?;
        let key = record_key(id);
        files
            .remove(&key)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        files
            .remove(payload_key(&key))
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        self.db
            .persist(PersistMode::SyncAll)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        debug!(id = id, "file deleted");
        Ok(())
    }

    /// Remove every queued record.
    ///
    /// Serialized under the write lock, so no concurrent operation observes
    /// a partial clear.
    pub fn clear_files(&self) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;

        let files = self.files_keyspace()?;
        let keys: Vec<String> = files
            .prefix("")
            .filter_map(|kv| kv.key().ok())
            .map(|k| String::from_utf8_lossy(&k).into_owned())
            .collect();
        let count = keys.len();
        // Metadata first, payloads second: an interrupted clear leaves only
        // orphaned side keys, never a listed record missing its payload.
        for key in keys.iter().filter(|k| !k.ends_with(PAYLOAD_SUFFIX)) {
            files
                .remove(key)
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }
        for key in keys.iter().filter(|k| k.ends_with(PAYLOAD_SUFFIX)) {
            files
                .remove(key)
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }
        self.db
            .persist(PersistMode::SyncAll)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        info!(entries = count, "queue cleared");
        Ok(())
    }

    // Configuration entries

    /// Read one configuration value, `None` when unset.
    pub fn get_config(&self, key: &str) -> Result<Option<String>, StoreError> {
        let config = self.config_keyspace()?;
        let Some(raw) = config
            .get(key)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
        else {
            return Ok(None);
        };
        let value = String::from_utf8(raw.to_vec())
            .map_err(|_| StoreError::InvalidFormat(format!("config '{}' is not UTF-8", key)))?;
        Ok(Some(value))
    }

    /// Write one configuration value, overwriting any previous entry.
    pub fn put_config(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;

        let config = self.config_keyspace()?;
        config
            .insert(key, value.as_bytes())
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        self.db
            .persist(PersistMode::SyncAll)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        debug!(key = key, "config entry written");
        Ok(())
    }

    // Helper methods

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::WriteFailed("store write lock poisoned".to_string()))
    }

    fn files_keyspace(&self) -> Result<Keyspace, StoreError> {
        Ok(self
            .db
            .keyspace(FILES_KEYSPACE, KeyspaceCreateOptions::default)?)
    }

    fn config_keyspace(&self) -> Result<Keyspace, StoreError> {
        Ok(self
            .db
            .keyspace(CONFIG_KEYSPACE, KeyspaceCreateOptions::default)?)
    }

    /// Next id to assign. Only call with the write lock held.
    fn peek_next_id(&self) -> Result<u64, StoreError> {
        let Some(raw) = self
            .meta
            .get(META_NEXT_ID_KEY)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
        else {
            return Ok(1);
        };
        let bytes: [u8; 8] = raw
            .as_ref()
            .try_into()
            .map_err(|_| StoreError::InvalidFormat("invalid next_id entry".to_string()))?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Record keys in order, skipping payload side keys.
    fn record_keys(files: &Keyspace) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for kv in files.prefix("") {
            let Ok(key_bytes) = kv.key() else {
                continue;
            };
            let key = String::from_utf8_lossy(&key_bytes);
            if key.ends_with(PAYLOAD_SUFFIX) {
                continue;
            }
            keys.push(key.into_owned());
        }
        Ok(keys)
    }
}

/// Zero-padded decimal key so lexicographic order matches insertion order.
fn record_key(id: u64) -> String {
    format!("{:020}", id)
}

fn payload_key(record_key: &str) -> String {
    format!("{}{}", record_key, PAYLOAD_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keys_sort_numerically() {
        let a = record_key(9);
        let b = record_key(10);
        let c = record_key(100);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn payload_key_is_side_key() {
        let key = record_key(3);
        assert_eq!(payload_key(&key), format!("{}.payload", key));
    }
}
