//! Fetching reference library images by name.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ReferenceName;

/// File extension of reference library images.
pub const LIBRARY_EXTENSION: &str = "qlib";

/// Failure to fetch one reference.
///
/// Always scoped to a single name; the resolver records it and moves on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("reference `{0}` was not found")]
    NotFound(ReferenceName),
    #[error("failed to read reference `{name}`: {source}")]
    Io {
        name: ReferenceName,
        #[source]
        source: std::io::Error,
    },
    #[error("fetching reference `{name}` timed out after {after:?}")]
    Timeout { name: ReferenceName, after: Duration },
}

/// Transport that produces the raw bytes of a reference library.
#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch(&self, name: &ReferenceName) -> Result<Vec<u8>, FetchError>;
}

/// Reads `<root>/<Name>.qlib` from the local filesystem.
#[derive(Clone, Debug)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryFetcher { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, name: &ReferenceName) -> PathBuf {
        self.root.join(name.file_name())
    }
}

#[async_trait]
impl ReferenceFetcher for DirectoryFetcher {
    async fn fetch(&self, name: &ReferenceName) -> Result<Vec<u8>, FetchError> {
        let path = self.path_of(name);
        tracing::debug!(path = %path.display(), "reading reference image");
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(name.clone())
            } else {
                FetchError::Io {
                    name: name.clone(),
                    source,
                }
            }
        })
    }
}

/// In-process table of bundled reference images.
///
/// Counts fetches per name, and can simulate a slow transport with a fixed
/// delay before every fetch.
#[derive(Default)]
pub struct MemoryFetcher {
    images: FxHashMap<ReferenceName, Arc<[u8]>>,
    delay: Option<Duration>,
    fetches: Mutex<FxHashMap<ReferenceName, usize>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        MemoryFetcher::default()
    }

    #[must_use]
    pub fn with_image(mut self, name: ReferenceName, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.images.insert(name, bytes.into());
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `name` has been fetched, successful or not.
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches.lock().get(name).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }
}

#[async_trait]
impl ReferenceFetcher for MemoryFetcher {
    async fn fetch(&self, name: &ReferenceName) -> Result<Vec<u8>, FetchError> {
        *self.fetches.lock().entry(name.clone()).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.images
            .get(name.as_str())
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| FetchError::NotFound(name.clone()))
    }
}
