//! Cache-generation storage over fjall.

use std::path::Path;
use std::sync::Mutex;

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};

use crate::logging::{debug, info, trace, warn};

use super::error::CacheError;
use super::generation::CachedResponse;

/// Keyspace-name prefix for generation entry keyspaces.
const GEN_PREFIX: &str = "gen_";
/// Internal metadata keyspace.
const META_KEYSPACE: &str = "_meta";

/// Meta keys.
const META_GENERATIONS_KEY: &str = "generations";
const META_CURRENT_KEY: &str = "current";

/// Side-key suffix for response bodies.
const BODY_SUFFIX: &str = ".body";

/// Owner of all cache generations.
///
/// Generations are staged during install, committed as current on
/// activation, and pruned by name: after [`prune`](Self::prune), exactly the
/// current generation remains. Entries within a generation are keyed by
/// exact request URL; re-caching a URL overwrites its prior entry.
pub struct CacheManager {
    db: fjall::Database,
    meta: Keyspace,
    registry_lock: Mutex<()>,
}

impl CacheManager {
    /// Open the cache database at `path`, creating it if necessary.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening cache database");

        let db = fjall::Database::builder(path)
            .open()
            .map_err(|e| CacheError::Unavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let meta = db.keyspace(META_KEYSPACE, KeyspaceCreateOptions::default)?;

        Ok(Self {
            db,
            meta,
            registry_lock: Mutex::new(()),
        })
    }

    /// Register a fresh generation without making it current.
    ///
    /// Staging an already-known name clears its entries first, so a retried
    /// install starts from an empty generation. The current generation is
    /// refused outright: it keeps serving until a differently-named
    /// generation commits, so a failed install can never leave it gutted.
    pub fn stage(&self, name: &str) -> Result<(), CacheError> {
        let _guard = self.lock_registry()?;

        if self.current()?.as_deref() == Some(name) {
            warn!(generation = name, "refusing to stage the current generation");
            return Err(CacheError::GenerationActive(name.to_string()));
        }

        let mut names = self.read_registry()?;
        if names.iter().any(|n| n == name) {
            self.clear_entries(name)?;
        } else {
            names.push(name.to_string());
            self.write_registry(&names)?;
        }
        let _ = self.entries_keyspace(name)?;
        self.db.persist(PersistMode::SyncAll)?;

        debug!(generation = name, "generation staged");
        Ok(())
    }

    /// Make `name` the single current generation.
    pub fn commit(&self, name: &str) -> Result<(), CacheError> {
        let _guard = self.lock_registry()?;

        let names = self.read_registry()?;
        if !names.iter().any(|n| n == name) {
            return Err(CacheError::GenerationNotFound(name.to_string()));
        }
        self.meta.insert(META_CURRENT_KEY, name.as_bytes())?;
        self.db.persist(PersistMode::SyncAll)?;

        info!(generation = name, "generation committed as current");
        Ok(())
    }

    /// Name of the current generation, if one has ever been committed.
    pub fn current(&self) -> Result<Option<String>, CacheError> {
        let Some(raw) = self.meta.get(META_CURRENT_KEY)? else {
            return Ok(None);
        };
        let name = String::from_utf8(raw.to_vec())
            .map_err(|_| CacheError::InvalidFormat("current generation is not UTF-8".to_string()))?;
        Ok(Some(name))
    }

    /// All registered generation names, current or stale.
    pub fn generations(&self) -> Result<Vec<String>, CacheError> {
        self.read_registry()
    }

    /// Delete every generation whose name differs from the current one.
    ///
    /// This is the sole garbage-collection mechanism; it runs on worker
    /// activation.
    pub fn prune(&self) -> Result<usize, CacheError> {
        let _guard = self.lock_registry()?;

        let current = match self.meta.get(META_CURRENT_KEY)? {
            Some(raw) => String::from_utf8_lossy(raw.as_ref()).into_owned(),
            None => {
                warn!("prune requested with no current generation");
                return Ok(0);
            }
        };

        let names = self.read_registry()?;
        let mut deleted = 0;
        for name in &names {
            if *name != current {
                self.clear_entries(name)?;
                deleted += 1;
                info!(generation = %name, "stale generation deleted");
            }
        }
        self.write_registry(&[current])?;
        self.db.persist(PersistMode::SyncAll)?;

        Ok(deleted)
    }

    /// Drop a staged generation that never became current, removing its
    /// entries and registry record. Discarding the current generation is
    /// refused.
    pub fn discard(&self, name: &str) -> Result<(), CacheError> {
        let _guard = self.lock_registry()?;

        if self.current()?.as_deref() == Some(name) {
            return Err(CacheError::GenerationActive(name.to_string()));
        }
        self.clear_entries(name)?;
        let names: Vec<String> = self
            .read_registry()?
            .into_iter()
            .filter(|n| n != name)
            .collect();
        self.write_registry(&names)?;
        self.db.persist(PersistMode::SyncAll)?;

        debug!(generation = name, "staged generation discarded");
        Ok(())
    }

    /// Store one response in a generation, overwriting any prior entry for
    /// the URL.
    pub fn put(&self, name: &str, url: &str, response: &CachedResponse) -> Result<(), CacheError> {
        let entries = self.entries_keyspace(name)?;
        entries.insert(url, response.encode_meta()?)?;
        entries.insert(body_key(url), response.body.as_slice())?;
        self.db.persist(PersistMode::SyncAll)?;

        trace!(generation = name, url = url, size = response.body.len(), "response cached");
        Ok(())
    }

    /// Look up a cached response in a generation.
    pub fn get(&self, name: &str, url: &str) -> Result<Option<CachedResponse>, CacheError> {
        let entries = self.entries_keyspace(name)?;
        let Some(meta) = entries.get(url)? else {
            return Ok(None);
        };
        let body = entries
            .get(body_key(url))?
            .map(|v| v.to_vec())
            .unwrap_or_default();
        Ok(Some(CachedResponse::decode(meta.as_ref(), body)?))
    }

    /// Look up a cached response in the current generation.
    pub fn get_current(&self, url: &str) -> Result<Option<CachedResponse>, CacheError> {
        match self.current()? {
            Some(name) => self.get(&name, url),
            None => Ok(None),
        }
    }

    /// Store one response in the current generation; a no-op when no
    /// generation has been committed yet.
    pub fn put_current(&self, url: &str, response: &CachedResponse) -> Result<(), CacheError> {
        if let Some(name) = self.current()? {
            self.put(&name, url, response)?;
        }
        Ok(())
    }

    // Helper methods

    fn lock_registry(&self) -> Result<std::sync::MutexGuard<'_, ()>, CacheError> {
        self.registry_lock
            .lock()
            .map_err(|_| CacheError::InvalidFormat("cache registry lock poisoned".to_string()))
    }

    fn entries_keyspace(&self, name: &str) -> Result<Keyspace, CacheError> {
        let keyspace_name = format!("{}{}", GEN_PREFIX, name);
        Ok(self
            .db
            .keyspace(&keyspace_name, KeyspaceCreateOptions::default)?)
    }

    fn clear_entries(&self, name: &str) -> Result<(), CacheError> {
        let entries = self.entries_keyspace(name)?;
        let keys: Vec<Vec<u8>> = entries
            .prefix("")
            .filter_map(|kv| kv.key().ok().map(|k| k.to_vec()))
            .collect();
        for key in keys {
            entries.remove(&key)?;
        }
        Ok(())
    }

    fn read_registry(&self) -> Result<Vec<String>, CacheError> {
        let Some(raw) = self.meta.get(META_GENERATIONS_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_slice(raw.as_ref())
            .map_err(|e| CacheError::InvalidFormat(e.to_string()))
    }

    fn write_registry(&self, names: &[String]) -> Result<(), CacheError> {
        let raw = serde_json::to_vec(names).map_err(|e| CacheError::InvalidFormat(e.to_string()))?;
        self.meta.insert(META_GENERATIONS_KEY, raw)?;
        Ok(())
    }
}

fn body_key(url: &str) -> String {
    format!("{}{}", url, BODY_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::super::generation::generation_name;
    use super::*;
    use tempfile::TempDir;

    fn open_manager() -> (CacheManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let manager = CacheManager::open(dir.path().join("cache")).unwrap();
        (manager, dir)
    }

    #[test]
    fn stage_commit_and_lookup() {
        let (cache, _dir) = open_manager();
        let name = generation_name("v1");

        cache.stage(&name).unwrap();
        cache
            .put(&name, "/index.html", &CachedResponse::ok("text/html", b"hi".to_vec()))
            .unwrap();
        assert!(cache.get_current("/index.html").unwrap().is_none());

        cache.commit(&name).unwrap();
        let hit = cache.get_current("/index.html").unwrap().unwrap();
        assert_eq!(hit.body, b"hi");
    }

    #[test]
    fn staging_the_current_generation_is_refused() {
        let (cache, _dir) = open_manager();
        let name = generation_name("v1");

        cache.stage(&name).unwrap();
        cache
            .put(&name, "/index.html", &CachedResponse::ok("text/html", b"shell".to_vec()))
            .unwrap();
        cache.commit(&name).unwrap();

        assert!(matches!(
            cache.stage(&name),
            Err(CacheError::GenerationActive(_))
        ));
        // The committed entries were not touched.
        assert_eq!(cache.get_current("/index.html").unwrap().unwrap().body, b"shell");
    }

    #[test]
    fn commit_unknown_generation_fails() {
        let (cache, _dir) = open_manager();
        assert!(matches!(
            cache.commit("filevault-cache-v9"),
            Err(CacheError::GenerationNotFound(_))
        ));
    }

    #[test]
    fn prune_keeps_only_current() {
        let (cache, _dir) = open_manager();
        let old = generation_name("v1");
        let new = generation_name("v2");

        cache.stage(&old).unwrap();
        cache
            .put(&old, "/a", &CachedResponse::ok("text/plain", b"old".to_vec()))
            .unwrap();
        cache.commit(&old).unwrap();

        cache.stage(&new).unwrap();
        cache
            .put(&new, "/a", &CachedResponse::ok("text/plain", b"new".to_vec()))
            .unwrap();
        cache.commit(&new).unwrap();

        let deleted = cache.prune().unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(cache.generations().unwrap(), vec![new.clone()]);
        assert!(cache.get(&old, "/a").unwrap().is_none());
        assert_eq!(cache.get(&new, "/a").unwrap().unwrap().body, b"new");
    }

    #[test]
    fn recaching_overwrites_entry() {
        let (cache, _dir) = open_manager();
        let name = generation_name("v1");
        cache.stage(&name).unwrap();
        cache.commit(&name).unwrap();

        cache
            .put_current("/app.js", &CachedResponse::ok("text/javascript", b"v1".to_vec()))
            .unwrap();
        cache
            .put_current("/app.js", &CachedResponse::ok("text/javascript", b"v2".to_vec()))
            .unwrap();
        assert_eq!(cache.get_current("/app.js").unwrap().unwrap().body, b"v2");
    }
}
