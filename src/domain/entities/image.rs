//! Catalog image descriptors and grid cell identifiers.

use std::fmt;

use sha2::{Digest, Sha256};

/// One image reference returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
    id: String,
    source_url: String,
}

impl ImageDescriptor {
    /// Creates a descriptor from an identifier and an absolute source URL.
    #[must_use]
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
        }
    }

    /// Returns the catalog identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the URL of the raw image bytes.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Returns the key this image is cached under.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.source_url
    }
}

/// Identifies one grid cell.
///
/// Catalog ids are unique within a page only, so the same id showing up on two
/// pages yields two independent cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    /// Page the descriptor was loaded from.
    pub page: u32,
    /// Catalog identifier of the descriptor.
    pub image_id: String,
}

impl CellId {
    /// Creates a cell identifier.
    #[must_use]
    pub fn new(page: u32, image_id: impl Into<String>) -> Self {
        Self {
            page,
            image_id: image_id.into(),
        }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}/{}", self.page, self.image_id)
    }
}

/// Derives a filesystem-safe name from a cache key.
#[must_use]
pub fn hashed_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}
