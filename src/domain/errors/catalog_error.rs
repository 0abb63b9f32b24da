//! Catalog listing error types.

use thiserror::Error;

/// Failure of a single catalog page request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum CatalogError {
    #[error("network error while listing catalog: {message}")]
    Network { message: String },

    #[error("malformed catalog response: {message}")]
    Parse { message: String },
}

impl CatalogError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Returns whether error is network related.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// A failed page load as surfaced to gallery observers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load catalog page {page}: {source}")]
pub struct PageLoadError {
    /// The page that was requested.
    pub page: u32,
    /// The underlying catalog failure.
    #[source]
    pub source: CatalogError,
}

impl PageLoadError {
    /// Wraps a catalog error for the given page.
    #[must_use]
    pub const fn new(page: u32, source: CatalogError) -> Self {
        Self { page, source }
    }
}
