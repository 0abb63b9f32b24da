//! Application configuration.

/// Configuration file model.
pub mod app_config;
/// Command-line arguments.
pub mod args;
/// Config file loading.
pub mod storage;

pub use app_config::{AppConfig, CacheConfig, CatalogConfig, FetchConfig, LogLevel};
pub use args::CliArgs;
pub use storage::{ConfigError, ConfigStorage};
