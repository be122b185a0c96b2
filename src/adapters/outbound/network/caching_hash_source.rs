use crate::bom::domain::ContentHash;
use crate::ports::outbound::HashSource;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Cache key for resolved hashes
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct CacheKey {
    name: String,
    version: String,
}

impl CacheKey {
    fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

/// CachingHashSource wraps a HashSource and adds in-memory caching.
///
/// The same (name, version) pair can be looked up by several workers in one
/// run, e.g. a Python package required by more than one other package.
/// Only successful lookups are cached; failures are retried by the next caller.
pub struct CachingHashSource<S: HashSource> {
    inner: S,
    cache: Arc<DashMap<CacheKey, ContentHash>>,
}

impl<S: HashSource> CachingHashSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Returns the current cache size (for testing/monitoring)
    #[cfg(test)]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<S: HashSource> HashSource for CachingHashSource<S> {
    async fn resolve(&self, name: &str, version: &str) -> Result<ContentHash> {
        let key = CacheKey::new(name, version);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let hash = self.inner.resolve(name, version).await?;
        self.cache.insert(key, hash.clone());

        Ok(hash)
    }
}
