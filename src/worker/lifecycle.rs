//! Worker lifecycle state machine.
//!
//! The standard background-worker lifecycle, made explicit so it can be
//! driven and tested deterministically:
//!
//! ```text
//! Installing --install--> Waiting --skip_waiting--> Activating --activate--> Active
//! ```
//!
//! Install populates a staged cache generation with the full application
//! shell and fails atomically: if any shell resource cannot be fetched, the
//! staged generation is discarded and the previously committed generation
//! keeps serving. Activation commits the staged generation and prunes every
//! other one.

use std::future::Future;
use std::sync::Arc;

use crate::cache::{generation_name, CacheManager, CachedResponse};
use crate::logging::{error, info, warn};

use super::error::WorkerError;

/// Lifecycle states of the intercept worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Registered; populating a fresh cache generation.
    Installing,
    /// Installed; waiting to take over from the previous revision.
    Waiting,
    /// Taking over: committing the new generation, pruning stale ones.
    Activating,
    /// Serving intercepted requests for all clients.
    Active,
}

/// The intercept worker: lifecycle driver around the cache manager.
pub struct InterceptWorker {
    cache: Arc<CacheManager>,
    version_tag: String,
    state: WorkerState,
    staged: Option<String>,
}

impl InterceptWorker {
    /// Register a worker revision. The worker starts in
    /// [`WorkerState::Installing`].
    pub fn new(cache: Arc<CacheManager>, version_tag: &str) -> Self {
        Self {
            cache,
            version_tag: version_tag.to_string(),
            state: WorkerState::Installing,
            staged: None,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Name of the cache generation for this worker revision.
    pub fn generation(&self) -> String {
        generation_name(&self.version_tag)
    }

    /// Populate a staged generation with every application-shell resource.
    ///
    /// `fetch` resolves one URL to a captured response; a transport error or
    /// a non-2xx status for any resource fails the whole install. On
    /// failure, the staged generation is discarded and the previous current
    /// generation is left serving unchanged; a partially-cached shell never
    /// activates. A revision whose generation is already current cannot be
    /// reinstalled in place; publishing a new shell requires a new version
    /// tag.
    pub async fn install<F, Fut>(
        &mut self,
        shell_urls: &[String],
        fetch: F,
    ) -> Result<(), WorkerError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<CachedResponse, String>>,
    {
        if self.state != WorkerState::Installing {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to: WorkerState::Waiting,
            });
        }

        let name = self.generation();
        info!(generation = %name, resources = shell_urls.len(), "installing worker");
        self.cache.stage(&name)?;

        for url in shell_urls {
            let failure = match fetch(url.clone()).await {
                Ok(response) if response.is_success() => {
                    self.cache.put(&name, url, &response)?;
                    None
                }
                Ok(response) => Some(format!("unexpected status {}", response.status)),
                Err(reason) => Some(reason),
            };
            if let Some(reason) = failure {
                error!(url = %url, reason = %reason, "shell resource fetch failed, aborting install");
                self.cache.discard(&name)?;
                return Err(WorkerError::InstallFailed {
                    url: url.clone(),
                    reason,
                });
            }
        }

        self.staged = Some(name);
        self.state = WorkerState::Waiting;
        info!("worker installed");
        Ok(())
    }

    /// Request immediate activation instead of waiting for old clients to
    /// close. This system always skips waiting to minimize staleness.
    pub fn skip_waiting(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Waiting {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to: WorkerState::Activating,
            });
        }
        self.state = WorkerState::Activating;
        Ok(())
    }

    /// Commit the staged generation as current and delete every other one,
    /// then begin intercepting for all existing clients immediately.
    pub fn activate(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Activating {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to: WorkerState::Active,
            });
        }
        let Some(name) = self.staged.take() else {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to: WorkerState::Active,
            });
        };

        self.cache.commit(&name)?;
        let pruned = self.cache.prune()?;
        if pruned > 0 {
            info!(pruned = pruned, "stale cache generations deleted");
        }
        self.state = WorkerState::Active;
        info!(generation = %name, "worker active, clients claimed");
        Ok(())
    }

    /// Drive the full lifecycle: install, skip waiting, activate.
    ///
    /// On install failure the error is returned and the previous generation,
    /// if any, keeps serving; callers typically log and continue with the
    /// old cache.
    pub async fn run<F, Fut>(&mut self, shell_urls: &[String], fetch: F) -> Result<(), WorkerError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<CachedResponse, String>>,
    {
        self.install(shell_urls, fetch).await?;
        self.skip_waiting()?;
        self.activate()?;
        Ok(())
    }

    /// Whether the committed generation matches this revision; used to skip
    /// a redundant reinstall when the shell is already current.
    pub fn is_current_generation(&self) -> Result<bool, WorkerError> {
        let current = self.cache.current()?;
        if current.as_deref() == Some(self.generation().as_str()) {
            Ok(true)
        } else {
            if current.is_some() {
                warn!(generation = %self.generation(), "committed generation belongs to another revision");
            }
            Ok(false)
        }
    }
}
