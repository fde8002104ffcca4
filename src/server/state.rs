//! Application state management.

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::reconcile::Reconciler;
use crate::store::VaultStore;
use crate::worker::InterceptConfig;

use super::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The one live vault store connection, shared by every handler.
    pub store: Arc<VaultStore>,
    /// Cache-generation storage.
    pub cache: Arc<CacheManager>,
    /// Reconciler bound to the store.
    pub reconciler: Arc<Reconciler>,
    /// Intercept paths, sourced from persisted configuration.
    pub intercept: InterceptConfig,
    /// Upstream vault base URL, if configured.
    pub upstream: Option<String>,
    /// HTTP client used by the caching gateway.
    pub client: reqwest::Client,
}

impl AppState {
    /// Create a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let store =
            Arc::new(
                VaultStore::open(&config.store.path).map_err(|e| StateError::OpenStore {
                    path: config.store.path.clone(),
                    source: e,
                })?,
            );
        let cache = Arc::new(CacheManager::open(&config.store.cache_path).map_err(|e| {
            StateError::OpenCache {
                path: config.store.cache_path.clone(),
                source: e,
            }
        })?);
        let client = reqwest::Client::new();
        let reconciler = Arc::new(Reconciler::with_client(Arc::clone(&store), client.clone()));

        Ok(Self {
            store,
            cache,
            reconciler,
            intercept: config.worker.intercept.clone(),
            upstream: config.upstream.base_url.clone(),
            client,
        })
    }

    /// Resolve a request path against the upstream base URL.
    pub fn upstream_url(&self, path_and_query: &str) -> Option<String> {
        self.upstream
            .as_ref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), path_and_query))
    }
}

/// Errors that can occur when setting up application state.
#[derive(Debug)]
pub enum StateError {
    /// Failed to open the vault store.
    OpenStore {
        path: String,
        source: crate::store::StoreError,
    },
    /// Failed to open the cache database.
    OpenCache {
        path: String,
        source: crate::cache::CacheError,
    },
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::OpenStore { path, source } => {
                write!(f, "Failed to open vault store at '{}': {}", path, source)
            }
            StateError::OpenCache { path, source } => {
                write!(f, "Failed to open cache database at '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for StateError {}
