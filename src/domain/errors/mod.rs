//! Domain error types.

mod catalog_error;
mod fetch_error;
mod gallery_error;
mod storage_error;

pub use catalog_error::{CatalogError, PageLoadError};
pub use fetch_error::{FetchError, FetchErrorKind};
pub use gallery_error::GalleryError;
pub use storage_error::StorageError;
