//! Port definition for the persistent cache tier.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::StorageError;

/// Durable key to bytes store consulted on memory cache misses.
/// Implementations must be thread-safe.
#[async_trait]
pub trait PersistentCachePort: Send + Sync {
    /// Reads the bytes stored under `key`. Read failures count as misses.
    async fn get_bytes(&self, key: &str) -> Option<Bytes>;

    /// Stores bytes under `key`, replacing any previous entry atomically.
    async fn put_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Removes the entry for `key`, if any.
    async fn evict(&self, key: &str);

    /// Removes every entry.
    async fn clear(&self) -> Result<(), StorageError>;
}
