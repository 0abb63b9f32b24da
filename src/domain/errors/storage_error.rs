//! Persistent cache storage errors.

use thiserror::Error;

/// I/O failure of the persistent cache tier.
///
/// Never fatal: the cache store logs these and carries on with the memory tier.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum StorageError {
    #[error("failed to prepare cache directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to {operation} cache entry: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Creates an I/O error for the named operation.
    #[must_use]
    pub const fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }
}
