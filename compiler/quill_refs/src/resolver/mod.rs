//! Fetch-once resolution of reference names into a catalog.

use std::sync::Arc;
use std::time::Duration;

use quill_ir::BinaryModule;
use rustc_hash::FxHashSet;
use tokio::sync::Mutex;

use crate::{FetchError, ReferenceCatalog, ReferenceFetcher, ReferenceModule, ReferenceName};

/// Default bound on a single reference fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-lifetime cache of resolved references.
///
/// The lock is held across fetches: a second caller asking for a name that
/// is being fetched waits for the first, then finds it cached.
pub struct ReferenceResolver {
    fetcher: Arc<dyn ReferenceFetcher>,
    fetch_timeout: Duration,
    state: Mutex<ResolverState>,
}

#[derive(Default)]
struct ResolverState {
    catalog: ReferenceCatalog,
    failures: Vec<(ReferenceName, FetchError)>,
}

impl ResolverState {
    fn has_failed(&self, name: &ReferenceName) -> bool {
        self.failures.iter().any(|(failed, _)| failed == name)
    }
}

impl ReferenceResolver {
    pub fn new(fetcher: Arc<dyn ReferenceFetcher>) -> Self {
        ReferenceResolver {
            fetcher,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            state: Mutex::new(ResolverState::default()),
        }
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Resolve `names` into a catalog, fetching only names never tried before.
    ///
    /// Duplicates in `names` are ignored (first occurrence wins). The result
    /// holds the requested names that resolved, in request order. Names whose
    /// fetch failed, now or earlier, are absent.
    #[tracing::instrument(level = "debug", skip_all, fields(requested = names.len()))]
    pub async fn resolve(&self, names: &[ReferenceName]) -> ReferenceCatalog {
        let mut state = self.state.lock().await;
        let mut seen = FxHashSet::default();
        let mut resolved = Vec::with_capacity(names.len());

        for name in names {
            if !seen.insert(name) {
                continue;
            }
            if let Some(cached) = state.catalog.get(name.as_str()) {
                resolved.push(cached.clone());
                continue;
            }
            if state.has_failed(name) {
                continue;
            }
            match self.fetch_one(name).await {
                Ok(module) => {
                    tracing::debug!(%name, bytes = module.len(), "reference cached");
                    let module = ReferenceModule::new(name.clone(), module);
                    state.catalog.append(module.clone());
                    resolved.push(module);
                }
                Err(err) => {
                    tracing::warn!(%name, error = %err, "skipping reference");
                    state.failures.push((name.clone(), err));
                }
            }
        }

        ReferenceCatalog::from_modules(resolved)
    }

    async fn fetch_one(&self, name: &ReferenceName) -> Result<BinaryModule, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(name)).await {
            Ok(bytes) => bytes.map(BinaryModule::from),
            Err(_) => Err(FetchError::Timeout {
                name: name.clone(),
                after: self.fetch_timeout,
            }),
        }
    }

    /// Everything cached so far, in the order it was first fetched.
    pub async fn cached(&self) -> ReferenceCatalog {
        self.state.lock().await.catalog.clone()
    }

    /// Names whose fetch failed, with the rendered error.
    pub async fn failures(&self) -> Vec<(ReferenceName, String)> {
        self.state
            .lock()
            .await
            .failures
            .iter()
            .map(|(name, err)| (name.clone(), err.to_string()))
            .collect()
    }
}
