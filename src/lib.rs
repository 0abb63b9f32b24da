//! Photogrid - a paginated image catalog client.
//!
//! This crate lists images from a remote catalog page by page, loads their
//! bytes through a memory and disk cache, and tracks the load state of every
//! grid cell for a presentation layer to observe.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the gallery controller.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing console output.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "photogrid";
