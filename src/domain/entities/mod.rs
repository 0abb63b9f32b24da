//! Domain entity definitions.

mod image;
mod load_state;

pub use image::{CellId, ImageDescriptor, hashed_key};
pub use load_state::{CellSnapshot, LoadState, PageState};
