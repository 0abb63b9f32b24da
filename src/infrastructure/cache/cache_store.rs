//! Two-tier image byte cache: memory first, then persistent storage.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use super::memory_cache::{CacheStats, MemoryByteCache};
use crate::domain::ports::PersistentCachePort;

/// Cache shared by every image fetch.
///
/// Persistence is best effort: storage failures are logged and never reach
/// callers.
pub struct CacheStore {
    memory: MemoryByteCache,
    persistent: Option<Arc<dyn PersistentCachePort>>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("memory_budget", &self.memory.budget())
            .field("persistent", &self.persistent.is_some())
            .finish()
    }
}

impl CacheStore {
    /// Creates a store with both tiers.
    #[must_use]
    pub fn new(memory_budget: u64, persistent: Arc<dyn PersistentCachePort>) -> Self {
        Self {
            memory: MemoryByteCache::new(memory_budget),
            persistent: Some(persistent),
        }
    }

    /// Creates a store without a persistent tier.
    #[must_use]
    pub fn memory_only(memory_budget: u64) -> Self {
        Self {
            memory: MemoryByteCache::new(memory_budget),
            persistent: None,
        }
    }

    /// Looks up `key` in memory, then on disk.
    ///
    /// A disk hit is copied back into memory. A total miss has no side effects.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        if let Some(bytes) = self.memory.get(key) {
            return Some(bytes);
        }

        let persistent = self.persistent.as_ref()?;
        let bytes = persistent.get_bytes(key).await?;
        debug!(key = %key, size = bytes.len(), "Promoting disk cache hit into memory");
        self.memory.put(key, bytes.clone());
        Some(bytes)
    }

    /// Stores `bytes` under `key` in both tiers.
    pub async fn put(&self, key: &str, bytes: Bytes) {
        if !self.memory.put(key, bytes.clone()) {
            trace!(key = %key, "Entry kept on disk only");
        }

        if let Some(persistent) = &self.persistent
            && let Err(e) = persistent.put_bytes(key, &bytes).await
        {
            warn!(key = %key, error = %e, "Failed to persist cache entry");
        }
    }

    /// Removes every entry from both tiers.
    pub async fn clear(&self) {
        self.memory.clear();
        if let Some(persistent) = &self.persistent
            && let Err(e) = persistent.clear().await
        {
            warn!(error = %e, "Failed to clear disk cache");
        }
        debug!("Cleared image caches");
    }

    /// Returns memory tier statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    /// Returns the memory tier.
    #[must_use]
    pub const fn memory(&self) -> &MemoryByteCache {
        &self.memory
    }
}
