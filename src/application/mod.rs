//! Application layer orchestrating catalog pages and image loads.

/// Gallery state store.
pub mod gallery_controller;

pub use gallery_controller::{GalleryConfig, GalleryController, PageLoadOutcome};
