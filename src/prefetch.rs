use dashmap::{DashMap, DashSet};
use std::path::Path;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::error::PrefetchError;

/// Loads the raw bytes behind an image source.
pub trait ImageFetch: Send + Sync + 'static {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, PrefetchError>;
}

/// Reads sources as local file paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl ImageFetch for FileFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, PrefetchError> {
        let path = Path::new(source);
        if !path.is_file() {
            return Err(PrefetchError::Fetch {
                source_uri: source.to_string(),
                reason: "not a local file".to_string(),
            });
        }
        std::fs::read(path).map_err(|source| PrefetchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fire-and-forget image warmup on a background pool.
///
/// Each source is fetched at most once while in flight; finished bytes stay
/// in the cache. Failures are logged and otherwise ignored.
pub struct ImagePrefetcher<F: ImageFetch = FileFetcher> {
    fetcher: Arc<F>,
    pool: Option<Arc<rayon::ThreadPool>>,
    pending: Arc<DashSet<String>>,
    cache: Arc<DashMap<String, Arc<[u8]>>>,
}

impl Default for ImagePrefetcher<FileFetcher> {
    fn default() -> Self {
        Self::new(FileFetcher)
    }
}

impl<F: ImageFetch> ImagePrefetcher<F> {
    pub fn new(fetcher: F) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_prefetch_threads())
            .thread_name(|idx| format!("prefetch-{}", idx))
            .build()
            .map(Arc::new)
            .map_err(|e| log::warn!("Prefetch pool unavailable, using global pool: {}", e))
            .ok();

        Self {
            fetcher: Arc::new(fetcher),
            pool,
            pending: Arc::new(DashSet::new()),
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Queue every image in the catalog. Returns how many fetches were started.
    pub fn prefetch(&self, catalog: &Catalog) -> usize {
        catalog.iter().filter(|item| self.request(&item.src)).count()
    }

    /// Queue one source unless it is cached or already in flight.
    pub fn request(&self, source: &str) -> bool {
        if self.cache.contains_key(source) || !self.pending.insert(source.to_string()) {
            return false;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let pending = Arc::clone(&self.pending);
        let cache = Arc::clone(&self.cache);
        let source = source.to_string();
        let job = move || {
            match fetcher.fetch(&source) {
                Ok(bytes) => {
                    log::debug!("Prefetched {} ({} bytes)", source, bytes.len());
                    cache.insert(source.clone(), Arc::from(bytes));
                }
                Err(e) => log::warn!("Prefetch failed: {}", e),
            }
            pending.remove(&source);
        };

        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
        true
    }

    pub fn get(&self, source: &str) -> Option<Arc<[u8]>> {
        self.cache.get(source).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_pending(&self, source: &str) -> bool {
        self.pending.contains(source)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Drop cached bytes, e.g. after the catalog source changed on disk.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

fn num_prefetch_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(4))
        .unwrap_or(2)
}
