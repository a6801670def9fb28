use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::api::{ApiError, Network, Request, Response};

use super::storage::validate_label;
use super::{Bucket, CacheError, CacheStorage, CachedData};

/// Lifecycle phase of the cache for the current version label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    /// Nothing has happened yet
    Idle,
    Installing,
    /// Bucket is committed but not yet serving
    Installed,
    /// Bucket is serving and stale buckets have been pruned
    Activated,
    /// Install failed; this version will never serve
    Redundant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivateReport {
    pub removed: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Populated the bucket from the network, then activated it
    Installed(ActivateReport),
    /// The bucket was already committed; activated without touching the network
    AlreadyInstalled(ActivateReport),
}

struct CacheState {
    phase: CachePhase,
    serving: Option<Arc<CachedData<Bucket>>>,
}

/// Versioned, cache-first network layer.
///
/// Wraps another `Network` and answers requests from the active bucket when
/// possible. Only one bucket label is ever kept after activation.
pub struct OfflineCache {
    version: String,
    manifest: Vec<String>,
    network: Arc<dyn Network>,
    storage: Arc<dyn CacheStorage>,
    state: RwLock<CacheState>,
}

impl OfflineCache {
    pub fn new(
        version: impl Into<String>,
        manifest: Vec<String>,
        network: Arc<dyn Network>,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<Self, CacheError> {
        let version = version.into();
        validate_label(&version)?;
        Ok(Self {
            version,
            manifest,
            network,
            storage,
            state: RwLock::new(CacheState {
                phase: CachePhase::Idle,
                serving: None,
            }),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    pub fn phase(&self) -> CachePhase {
        self.read_state().phase
    }

    /// Label of the bucket currently answering requests, if any
    pub fn serving_version(&self) -> Option<String> {
        self.read_state()
            .serving
            .as_ref()
            .map(|cached| cached.data.label.clone())
    }

    /// How long ago the serving bucket was populated
    pub fn serving_age(&self) -> Option<String> {
        self.read_state()
            .serving
            .as_ref()
            .map(|cached| cached.age_display())
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: CachePhase) {
        self.write_state().phase = phase;
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Populate the current bucket from the manifest.
    ///
    /// Every manifest entry must come back with a success status, otherwise
    /// nothing is committed and this version becomes redundant.
    pub async fn install(&self) -> Result<usize, CacheError> {
        self.set_phase(CachePhase::Installing);
        info!(version = %self.version, entries = self.manifest.len(), "Installing offline cache");

        match self.populate().await {
            Ok(count) => {
                self.set_phase(CachePhase::Installed);
                info!(version = %self.version, entries = count, "Offline cache installed");
                Ok(count)
            }
            Err(e) => {
                self.set_phase(CachePhase::Redundant);
                warn!(version = %self.version, error = %e, "Offline cache install failed");
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<usize, CacheError> {
        // Open (create-if-absent); nothing is written until every fetch succeeds
        let mut bucket = self
            .storage
            .load(&self.version)?
            .map(|cached| cached.data)
            .unwrap_or_else(|| Bucket::new(&self.version));

        let requests: Vec<Request> = self.manifest.iter().map(Request::get).collect();
        let responses = try_join_all(requests.iter().map(|r| self.fetch_manifest_entry(r))).await?;

        for (request, response) in requests.iter().zip(responses) {
            bucket.put(request, response);
        }

        self.storage.commit(&bucket)?;
        Ok(bucket.len())
    }

    async fn fetch_manifest_entry(&self, request: &Request) -> Result<Response, CacheError> {
        let response = self
            .network
            .send(request)
            .await
            .map_err(|source| CacheError::ManifestFetch {
                url: request.url.clone(),
                source,
            })?;

        if !response.is_success() {
            return Err(CacheError::ManifestStatus {
                url: request.url.clone(),
                status: response.status,
            });
        }

        debug!(url = %request.url, bytes = response.body.len(), "Fetched manifest entry");
        Ok(response)
    }

    /// Prune every bucket not labelled with the current version and start
    /// serving from the current one.
    ///
    /// Deletions are attempted independently; a failure is logged and
    /// reported but does not stop the others.
    pub fn activate(&self) -> Result<ActivateReport, CacheError> {
        if !matches!(self.phase(), CachePhase::Installed | CachePhase::Activated) {
            return Err(CacheError::NotInstalled(self.version.clone()));
        }

        let mut report = ActivateReport::default();
        for label in self.storage.labels()? {
            if label == self.version {
                continue;
            }
            match self.storage.delete(&label) {
                Ok(_) => {
                    info!(label = %label, "Removing old cache");
                    report.removed.push(label);
                }
                Err(e) => {
                    warn!(label = %label, error = %e, "Failed to remove old cache");
                    report.failed.push(label);
                }
            }
        }

        let bucket = self
            .storage
            .load(&self.version)?
            .ok_or_else(|| CacheError::NotInstalled(self.version.clone()))?;
        self.storage.set_active_label(&self.version)?;

        let mut state = self.write_state();
        state.serving = Some(Arc::new(bucket));
        state.phase = CachePhase::Activated;
        drop(state);

        info!(version = %self.version, removed = report.removed.len(), "Offline cache activated");
        Ok(report)
    }

    /// Drive the whole lifecycle the way a host would on startup.
    ///
    /// An already committed bucket for this version is not reinstalled. If
    /// installing fails, the previously active version keeps serving and
    /// the install error is returned.
    pub async fn register(&self) -> Result<RegisterOutcome, CacheError> {
        if self.storage.load(&self.version)?.is_some() {
            debug!(version = %self.version, "Offline cache already installed");
            self.set_phase(CachePhase::Installed);
            return Ok(RegisterOutcome::AlreadyInstalled(self.activate()?));
        }

        if let Err(e) = self.install().await {
            self.serve_previous();
            return Err(e);
        }

        Ok(RegisterOutcome::Installed(self.activate()?))
    }

    /// Start serving whatever is already on disk, without the network.
    ///
    /// A committed bucket for this version is activated; otherwise the
    /// previously active label (if any) answers until `register` finishes.
    /// Returns the label now serving.
    pub fn resume(&self) -> Result<Option<String>, CacheError> {
        if self.storage.load(&self.version)?.is_some() {
            self.set_phase(CachePhase::Installed);
            self.activate()?;
        } else {
            self.serve_previous();
        }
        Ok(self.serving_version())
    }

    fn serve_previous(&self) {
        let previous = match self.storage.active_label() {
            Ok(Some(label)) if label != self.version => label,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read previously active cache label");
                return;
            }
        };

        match self.storage.load(&previous) {
            Ok(Some(bucket)) => {
                info!(label = %previous, "Previous offline cache continues serving");
                self.write_state().serving = Some(Arc::new(bucket));
            }
            Ok(None) => debug!(label = %previous, "Previously active cache no longer stored"),
            Err(e) => warn!(label = %previous, error = %e, "Failed to load previous cache"),
        }
    }

    fn lookup(&self, request: &Request) -> Option<Response> {
        self.read_state()
            .serving
            .as_ref()
            .and_then(|cached| cached.data.get(request).cloned())
    }
}

#[async_trait]
impl Network for OfflineCache {
    /// Cache-first: a stored response is returned verbatim with no
    /// revalidation; a miss goes to the wrapped network unmodified.
    async fn send(&self, request: &Request) -> Result<Response, ApiError> {
        if let Some(response) = self.lookup(request) {
            debug!(request = %request, "Serving from offline cache");
            return Ok(response);
        }
        self.network.send(request).await
    }
}
