//! Infrastructure layer with external service adapters.

/// Two-tier image byte cache.
pub mod cache;
/// Catalog listing client.
pub mod catalog;
/// Application configuration.
pub mod config;
/// HTTP transport.
pub mod http;
/// Image fetching with request de-duplication.
pub mod image;

pub use cache::{CacheStats, CacheStore, DiskByteCache, MemoryByteCache};
pub use catalog::CatalogClient;
pub use config::{AppConfig, CliArgs, ConfigStorage, LogLevel};
pub use http::ReqwestTransport;
pub use image::{ImageFetcher, ImageFetcherConfig};
