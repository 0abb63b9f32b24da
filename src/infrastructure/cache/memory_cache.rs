//! In-memory LRU byte cache bounded by total size.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Default memory budget (32 MiB).
pub const DEFAULT_MEMORY_BUDGET: u64 = 32 * 1024 * 1024;

/// One resident entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cache key (the image source URL).
    pub key: String,
    /// Encoded image bytes.
    pub bytes: Bytes,
    /// Size accounted against the budget.
    pub size_bytes: u64,
    /// Last time the entry was read or written.
    pub last_accessed: Instant,
}

struct Inner {
    entries: LruCache<String, CacheEntry>,
    resident: u64,
}

/// Memory tier of the image cache.
///
/// Resident size never exceeds the budget: inserts evict least recently
/// accessed entries first, and an entry larger than the whole budget is
/// refused.
pub struct MemoryByteCache {
    inner: Mutex<Inner>,
    budget: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryByteCache {
    /// Creates a cache holding at most `budget` bytes.
    #[must_use]
    pub fn new(budget: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                resident: 0,
            }),
            budget,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up `key`, promoting it to most recently used on a hit.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.last_accessed = Instant::now();
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache hit");
            Some(entry.bytes.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    /// Inserts or replaces `key`, then evicts until within budget.
    ///
    /// Returns false if the entry alone exceeds the budget and was not stored.
    pub fn put(&self, key: &str, bytes: Bytes) -> bool {
        let size = bytes.len() as u64;
        let mut inner = self.inner.lock();

        if let Some(old) = inner.entries.pop(key) {
            inner.resident -= old.size_bytes;
        }

        if size > self.budget {
            debug!(key = %key, size = size, budget = self.budget, "Entry exceeds memory budget");
            return false;
        }

        inner.entries.put(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                bytes,
                size_bytes: size,
                last_accessed: Instant::now(),
            },
        );
        inner.resident += size;

        // The new entry is most recently used, so it is popped last; stop before it.
        while inner.resident > self.budget && inner.entries.len() > 1 {
            let Some((evicted, entry)) = inner.entries.pop_lru() else {
                break;
            };
            inner.resident -= entry.size_bytes;
            debug!(key = %evicted, size = entry.size_bytes, "Evicted from memory cache");
        }

        trace!(key = %key, size = size, resident = inner.resident, "Stored in memory cache");
        true
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.resident = 0;
        debug!("Cleared memory cache");
    }

    /// Returns whether `key` is resident.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Returns the bytes currently resident.
    pub fn resident_bytes(&self) -> u64 {
        self.inner.lock().resident
    }

    /// Returns the configured budget.
    #[must_use]
    pub const fn budget(&self) -> u64 {
        self.budget
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let inner = self.inner.lock();
        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: inner.entries.len(),
            resident_bytes: inner.resident,
        }
    }
}

impl Default for MemoryByteCache {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_BUDGET)
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of resident entries.
    pub entries: usize,
    /// Current resident size in bytes.
    pub resident_bytes: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {} bytes, {:.1}% hit rate ({} hits, {} misses)",
            self.entries, self.resident_bytes, self.hit_rate, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(len: usize) -> Bytes {
        Bytes::from(vec![7u8; len])
    }

    #[test]
    fn test_put_and_get() {
        let cache = MemoryByteCache::new(100);
        cache.put("a", Bytes::from_static(b"hello"));
        assert_eq!(cache.get("a"), Some(Bytes::from_static(b"hello")));
    }

    #[test]
    fn test_miss() {
        let cache = MemoryByteCache::new(100);
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn test_replace_updates_size() {
        let cache = MemoryByteCache::new(100);
        cache.put("a", bytes(40));
        cache.put("a", bytes(10));
        assert_eq!(cache.resident_bytes(), 10);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_accessed() {
        let cache = MemoryByteCache::new(30);
        cache.put("a", bytes(10));
        cache.put("b", bytes(10));
        cache.put("c", bytes(10));

        // Touch "a" so "b" becomes the oldest.
        assert!(cache.get("a").is_some());
        cache.put("d", bytes(10));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_never_evicts_just_inserted() {
        let cache = MemoryByteCache::new(30);
        cache.put("a", bytes(10));
        cache.put("b", bytes(10));
        cache.put("big", bytes(30));

        assert!(cache.contains("big"));
        assert!(!cache.contains("a"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.resident_bytes(), 30);
    }

    #[test]
    fn test_oversized_entry_is_refused() {
        let cache = MemoryByteCache::new(30);
        cache.put("a", bytes(10));
        assert!(!cache.put("huge", bytes(31)));
        assert!(!cache.contains("huge"));
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_budget_holds_after_any_sequence() {
        let cache = MemoryByteCache::new(64);
        for i in 0..200usize {
            cache.put(&format!("k{}", i % 17), bytes((i * 13) % 50 + 1));
            if i % 3 == 0 {
                let _ = cache.get(&format!("k{}", i % 5));
            }
            assert!(cache.resident_bytes() <= cache.budget());
        }
    }

    #[test]
    fn test_stats() {
        let cache = MemoryByteCache::new(100);
        cache.put("a", bytes(5));
        let _ = cache.get("a");
        let _ = cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.resident_bytes, 5);
    }

    #[test]
    fn test_clear() {
        let cache = MemoryByteCache::new(100);
        cache.put("a", bytes(5));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.resident_bytes(), 0);
    }
}
