//! Observer port through which the gallery publishes state transitions.

use tokio::sync::mpsc;

use crate::domain::entities::{CellId, LoadState, PageState};
use crate::domain::errors::PageLoadError;

/// A single published state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    /// A cell moved to a new load state.
    CellChanged {
        /// The cell that changed.
        cell: CellId,
        /// Its new state.
        state: LoadState,
    },
    /// Pagination state changed (load started, page applied).
    PageChanged(PageState),
    /// A page request failed; descriptors were left untouched.
    PageLoadFailed(PageLoadError),
}

/// Receives every gallery state transition, in order per cell.
///
/// Called while the gallery holds its state lock, so implementations must
/// return quickly and must not call back into the controller.
pub trait GalleryObserver: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &GalleryEvent);
}

impl GalleryObserver for mpsc::UnboundedSender<GalleryEvent> {
    fn on_event(&self, event: &GalleryEvent) {
        if self.send(event.clone()).is_err() {
            tracing::trace!("Gallery event receiver dropped");
        }
    }
}
