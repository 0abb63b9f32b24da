//! Disk-based byte cache for persistence across sessions.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::domain::entities::hashed_key;
use crate::domain::errors::StorageError;
use crate::domain::ports::PersistentCachePort;

/// Maximum disk cache size in bytes (200 MB default).
pub const DEFAULT_DISK_BUDGET: u64 = 200 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "img";

/// Disk tier that stores one file per key.
///
/// File modification times act as the eviction journal: they are refreshed on
/// every hit and the oldest files go first when the directory is over budget.
pub struct DiskByteCache {
    cache_dir: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
    write_lock: Mutex<()>,
}

impl DiskByteCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created or read.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        let dir_error = |source| StorageError::Directory {
            path: cache_dir.display().to_string(),
            source,
        };

        fs::create_dir_all(&cache_dir).await.map_err(dir_error)?;
        let mut entries = fs::read_dir(&cache_dir).await.map_err(dir_error)?;

        let mut total_size = 0u64;
        let mut count = 0usize;
        while let Ok(Some(entry)) = entries.next_entry().await {
            if is_entry_file(&entry.path())
                && let Ok(meta) = entry.metadata().await
            {
                total_size += meta.len();
                count += 1;
            }
        }

        debug!(
            dir = %cache_dir.display(),
            size = total_size,
            count = count,
            "Opened disk cache"
        );

        let cache = Self {
            cache_dir,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
            write_lock: Mutex::new(()),
        };

        {
            let _guard = cache.write_lock.lock().await;
            cache.cleanup_if_needed(None).await;
        }

        Ok(cache)
    }

    /// Returns the directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{ENTRY_EXTENSION}", hashed_key(key)))
    }

    /// Returns the current cache size in bytes.
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of cached files.
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if a key is cached.
    pub async fn contains(&self, key: &str) -> bool {
        fs::try_exists(self.entry_path(key)).await.unwrap_or(false)
    }

    async fn write_entry(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let dir = self.cache_dir.clone();
        let path = path.to_path_buf();
        let bytes = bytes.to_vec();

        // Write to a temp file in the same directory and rename it into place,
        // so readers never observe a partial entry.
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            use std::io::Write;
            let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
            temp.write_all(&bytes)?;
            temp.flush()?;
            temp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::io("write", std::io::Error::other(e)))?
        .map_err(|e| StorageError::io("write", e))
    }

    /// Removes the oldest entries once the directory is over budget, never
    /// touching `keep`. Caller must hold the write lock.
    async fn cleanup_if_needed(&self, keep: Option<&Path>) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = current_size,
            max_size = self.max_size,
            "Disk cache over limit, cleaning up"
        );

        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, SystemTime, u64)> = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_entry_file(&path) || keep.is_some_and(|k| k == path.as_path()) {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, modified, meta.len()));
            }
        }

        files.sort_by_key(|(_, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        let target = current_size - self.max_size + (self.max_size / 10);

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }

            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove old cache file");
            } else {
                trace!(path = %path.display(), "Removed old cache file");
                freed_size += size;
                freed_count += 1;
            }
        }
        self.current_size.fetch_sub(freed_size, Ordering::Relaxed);
        self.item_count.fetch_sub(freed_count, Ordering::Relaxed);

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "Disk cache cleanup complete"
        );
    }
}

#[async_trait]
impl PersistentCachePort for DiskByteCache {
    async fn get_bytes(&self, key: &str) -> Option<Bytes> {
        let path = self.entry_path(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(key = %key, path = %path.display(), "Disk cache hit");
                touch(path).await;
                Some(Bytes::from(bytes))
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(key = %key, error = %e, "Failed to read disk cache entry");
                }
                trace!(key = %key, "Disk cache miss");
                None
            }
        }
    }

    async fn put_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.entry_path(key);
        if bytes.len() as u64 > self.max_size {
            debug!(
                key = %key,
                size = bytes.len(),
                max_size = self.max_size,
                "Entry exceeds disk budget"
            );
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;

        let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();
        self.write_entry(&path, bytes).await?;

        let new_size = bytes.len() as u64;
        if let Some(old) = old_size {
            if new_size > old {
                self.current_size
                    .fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.current_size
                    .fetch_sub(old - new_size, Ordering::Relaxed);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(key = %key, path = %path.display(), size = bytes.len(), "Stored in disk cache");

        self.cleanup_if_needed(Some(&path)).await;
        Ok(())
    }

    async fn evict(&self, key: &str) {
        let path = self.entry_path(key);
        let _guard = self.write_lock.lock().await;

        let size = fs::metadata(&path).await.map(|m| m.len()).ok();
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key = %key, error = %e, "Failed to evict from disk cache");
            }
        } else if let Some(s) = size {
            self.current_size.fetch_sub(s, Ordering::Relaxed);
            self.item_count.fetch_sub(1, Ordering::Relaxed);
            debug!(key = %key, "Evicted from disk cache");
        }
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| StorageError::io("list", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io("list", e))?
        {
            let path = entry.path();
            if is_entry_file(&path) && fs::remove_file(&path).await.is_err() {
                warn!(path = %path.display(), "Failed to remove cache file");
            }
        }
        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!("Cleared disk cache");
        Ok(())
    }
}

fn is_entry_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
}

/// Refreshes the modification time so the entry counts as recently used.
async fn touch(path: PathBuf) {
    let result = tokio::task::spawn_blocking(move || {
        std::fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(SystemTime::now()))
    })
    .await;

    if let Ok(Err(e)) = result {
        trace!(error = %e, "Failed to refresh cache entry time");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_cache(max_size: u64) -> (DiskByteCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskByteCache::new(temp_dir.path().to_path_buf(), max_size)
            .await
            .unwrap();
        (cache, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get_bytes() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        let key = "https://picsum.photos/id/1/200/300";

        cache.put_bytes(key, b"test image data").await.unwrap();
        let retrieved = cache.get_bytes(key).await;

        assert_eq!(retrieved, Some(Bytes::from_static(b"test image data")));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        assert!(cache.get_bytes("http://x/none.jpg").await.is_none());
    }

    #[tokio::test]
    async fn test_evict() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        let key = "http://x/1.jpg";

        cache.put_bytes(key, b"test").await.unwrap();
        assert!(cache.contains(key).await);

        cache.evict(key).await;
        assert!(!cache.contains(key).await);
    }

    #[tokio::test]
    async fn test_counters_follow_writes() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;

        cache.put_bytes("k1", b"hello").await.unwrap();
        cache.put_bytes("k2", b"world!").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 11);

        cache.put_bytes("k1", b"hey").await.unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.current_size(), 9);

        cache.evict("k2").await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 3);

        cache.clear().await.unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.current_size(), 0);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskByteCache::new(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put_bytes("http://x/1.jpg", b"persisted").await.unwrap();
        }

        let reopened = DiskByteCache::new(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(
            reopened.get_bytes("http://x/1.jpg").await,
            Some(Bytes::from_static(b"persisted"))
        );
    }

    #[tokio::test]
    async fn test_cleanup_removes_oldest() {
        let (cache, _temp) = create_test_cache(10).await;

        cache.put_bytes("old", b"123456").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cache.put_bytes("new", b"123456").await.unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 6);
        assert!(cache.contains("new").await);
        assert!(!cache.contains("old").await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_entry_just_written() {
        let (cache, _temp) = create_test_cache(100).await;

        cache.put_bytes("old", &[0u8; 10]).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cache.put_bytes("new", &[1u8; 95]).await.unwrap();

        assert!(cache.contains("new").await);
        assert!(!cache.contains("old").await);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.current_size(), 95);
        assert_eq!(
            cache.get_bytes("new").await,
            Some(Bytes::from(vec![1u8; 95]))
        );
    }

    #[tokio::test]
    async fn test_entry_over_budget_is_refused() {
        let (cache, _temp) = create_test_cache(100).await;
        cache.put_bytes("kept", &[0u8; 10]).await.unwrap();

        cache.put_bytes("huge", &[1u8; 101]).await.unwrap();

        assert!(!cache.contains("huge").await);
        assert!(cache.contains("kept").await);
        assert_eq!(cache.current_size(), 10);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let (cache, temp) = create_test_cache(1024).await;
        cache.put_bytes("k", b"data").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(is_entry_file(&names[0]));
    }
}
