//! Image byte caching.
//!
//! This module provides:
//! - Memory caching with size-bounded LRU eviction
//! - Disk caching for persistence
//! - The two-tier store consulted by image fetches

pub mod cache_store;
pub mod disk_cache;
pub mod memory_cache;

pub use cache_store::CacheStore;
pub use disk_cache::{DEFAULT_DISK_BUDGET, DiskByteCache};
pub use memory_cache::{CacheEntry, CacheStats, DEFAULT_MEMORY_BUDGET, MemoryByteCache};
