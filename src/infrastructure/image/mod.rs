//! Image byte fetching.

pub mod fetcher;

pub use fetcher::{ImageFetcher, ImageFetcherConfig};
