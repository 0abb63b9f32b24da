//! Presentation layer: console rendering of gallery state.

/// Console event output.
pub mod console_observer;

pub use console_observer::{ConsoleObserver, render_grid};
