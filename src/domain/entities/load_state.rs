//! Per-cell load state and page state.

use std::fmt;

use bytes::Bytes;

use super::image::{CellId, ImageDescriptor};
use crate::domain::errors::FetchError;

/// Loading status of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nobody asked for the image yet.
    #[default]
    NotRequested,
    /// A fetch is running.
    Loading,
    /// The encoded image bytes are available.
    Loaded(Bytes),
    /// The last fetch failed; `retry` is allowed.
    Failed(FetchError),
}

impl LoadState {
    /// Returns true if the bytes are available.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Returns true if a fetch is running.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if the last fetch failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true for `Loaded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed(_))
    }

    /// Returns the loaded bytes, if any.
    #[must_use]
    pub const fn bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Loaded(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not requested"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded(bytes) => write!(f, "loaded ({} bytes)", bytes.len()),
            Self::Failed(error) => write!(f, "failed ({})", error.kind()),
        }
    }
}

/// Catalog pagination state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    /// Most recently applied page, starting at 1.
    pub page_number: u32,
    /// Descriptors in grid order.
    pub descriptors: Vec<ImageDescriptor>,
    /// True while any page request is outstanding.
    pub is_loading_next_page: bool,
    /// Set once the catalog answered with an empty page.
    pub end_of_catalog: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            page_number: 1,
            descriptors: Vec::new(),
            is_loading_next_page: false,
            end_of_catalog: false,
        }
    }
}

/// Point-in-time view of one cell for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSnapshot {
    /// Cell identifier.
    pub id: CellId,
    /// Descriptor bound to the cell.
    pub descriptor: ImageDescriptor,
    /// Current load state.
    pub state: LoadState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!LoadState::NotRequested.is_terminal());
        assert!(!LoadState::Loading.is_terminal());
        assert!(LoadState::Loaded(Bytes::from_static(b"x")).is_terminal());
        assert!(LoadState::Failed(FetchError::Timeout).is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LoadState::Loaded(Bytes::from_static(b"abc")).to_string(),
            "loaded (3 bytes)"
        );
        assert_eq!(
            LoadState::Failed(FetchError::Timeout).to_string(),
            "failed (timeout)"
        );
    }

    #[test]
    fn test_default_page_state() {
        let page = PageState::default();
        assert_eq!(page.page_number, 1);
        assert!(page.descriptors.is_empty());
        assert!(!page.is_loading_next_page);
    }
}
