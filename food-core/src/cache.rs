use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::FetchError;

/// Out-of-band image download capability.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Resolves once the image at `uri` is fully downloaded.
    async fn prefetch(&self, uri: &str) -> Result<(), FetchError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    loaded: bool,
    timestamp: Instant,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // insertion order, oldest first
    order: VecDeque<String>,
    // last fetch failed; cleared by a successful one
    failed: HashSet<String>,
}

impl CacheInner {
    fn remove(&mut self, uri: &str) {
        self.entries.remove(uri);
        if let Some(position) = self.order.iter().position(|existing| existing == uri) {
            self.order.remove(position);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub batches: usize,
}

/// Shared handle to the prefetch cache; clones point at the same entries.
#[derive(Clone)]
pub struct PrefetchCache {
    inner: Arc<Mutex<CacheInner>>,
    fetcher: Arc<dyn ImageFetcher>,
    config: CacheConfig,
}

impl fmt::Debug for PrefetchCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefetchCache")
            .field("size", &self.size())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PrefetchCache {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fetches one image and records it on success.
    ///
    /// Blank URIs fail without touching the network, and a URI that is
    /// already cached and fresh is not fetched again.
    pub async fn prefetch_one(&self, uri: &str) -> bool {
        if uri.trim().is_empty() {
            warn!(uri, "refusing to prefetch an invalid uri");
            return false;
        }
        if self.is_cached(uri) {
            debug!(uri, "image already cached");
            return true;
        }

        match self.fetcher.prefetch(uri).await {
            Ok(()) => {
                self.insert(uri);
                true
            }
            Err(err) => {
                warn!(uri, error = %err, "image prefetch failed");
                self.lock().failed.insert(uri.to_owned());
                false
            }
        }
    }

    /// Prefetches `uris` in sequential batches of `batch_size` concurrent
    /// fetches. Individual failures are logged and do not stop the loop.
    pub async fn prefetch_many<I, S>(&self, uris: I) -> PrefetchSummary
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let valid: Vec<String> = uris
            .into_iter()
            .map(Into::into)
            .filter(|uri| !uri.trim().is_empty())
            .collect();
        let mut summary = PrefetchSummary {
            requested: valid.len(),
            ..PrefetchSummary::default()
        };
        if valid.is_empty() {
            warn!("no valid uris to prefetch");
            return summary;
        }

        for batch in valid.chunks(self.config.batch_size.max(1)) {
            summary.batches += 1;
            let results = join_all(batch.iter().map(|uri| self.prefetch_one(uri))).await;
            let succeeded = results.iter().filter(|ok| **ok).count();
            summary.succeeded += succeeded;
            summary.failed += results.len() - succeeded;
        }

        debug!(
            requested = summary.requested,
            succeeded = summary.succeeded,
            failed = summary.failed,
            batches = summary.batches,
            "prefetch finished"
        );
        summary
    }

    /// True for a loaded entry younger than the TTL. Expired entries are
    /// dropped by the check.
    pub fn is_cached(&self, uri: &str) -> bool {
        let ttl = self.config.ttl();
        let mut guard = self.lock();
        let (expired, loaded) = match guard.entries.get(uri) {
            Some(entry) => (entry.timestamp.elapsed() > ttl, entry.loaded),
            None => return false,
        };
        if expired {
            debug!(uri, "cache entry expired");
            guard.remove(uri);
            return false;
        }
        loaded
    }

    fn insert(&self, uri: &str) {
        let capacity = self.config.capacity;
        let mut guard = self.lock();
        guard.failed.remove(uri);
        if guard.entries.contains_key(uri) {
            guard.remove(uri);
        }
        guard.order.push_back(uri.to_owned());
        guard.entries.insert(
            uri.to_owned(),
            CacheEntry {
                loaded: true,
                timestamp: Instant::now(),
            },
        );

        while guard.entries.len() > capacity {
            match guard.order.pop_front() {
                Some(oldest) => {
                    guard.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// True when the latest fetch of `uri` failed.
    pub fn has_failed(&self, uri: &str) -> bool {
        self.lock().failed.contains(uri)
    }

    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    /// Cached URIs, oldest first.
    pub fn uris(&self) -> Vec<String> {
        self.lock().order.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.entries.clear();
        guard.order.clear();
        guard.failed.clear();
    }
}
