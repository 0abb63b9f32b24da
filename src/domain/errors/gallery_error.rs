//! Gallery controller request errors.

use thiserror::Error;

use crate::domain::entities::{CellId, LoadState};

/// Rejected controller requests.
#[derive(Debug, Clone, PartialEq, Error)]
#[allow(missing_docs)]
pub enum GalleryError {
    #[error("no cell {cell} in the current grid")]
    UnknownCell { cell: CellId },

    #[error("cannot retry cell {cell} while it is {state}")]
    RetryRejected { cell: CellId, state: LoadState },

    #[error("cell {cell} was replaced by a reload while loading")]
    Superseded { cell: CellId },
}
