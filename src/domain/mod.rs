//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{CellId, CellSnapshot, ImageDescriptor, LoadState, PageState};
pub use errors::{CatalogError, FetchError, FetchErrorKind, GalleryError, PageLoadError, StorageError};
pub use ports::{GalleryEvent, GalleryObserver, HttpTransport, PersistentCachePort};
