//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::args::CliArgs;
use crate::infrastructure::cache::{DEFAULT_DISK_BUDGET, DEFAULT_MEMORY_BUDGET};
use crate::infrastructure::catalog::{DEFAULT_CATALOG_BASE, DEFAULT_PAGE_SIZE};

pub(super) const APP_NAME: &str = "photogrid";
pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "photogrid";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Catalog configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Download configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Catalog service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Service root; `/v2/list` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Images per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// First page loaded into an empty grid.
    #[serde(default = "default_start_page")]
    pub start_page: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CatalogConfig {
    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            start_page: default_start_page(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Image cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Memory tier budget in bytes.
    #[serde(default = "default_memory_budget")]
    pub memory_budget_bytes: u64,

    /// Disk tier budget in bytes. Zero disables the disk tier.
    #[serde(default = "default_disk_budget")]
    pub disk_budget_bytes: u64,

    /// Disk tier directory. Defaults to the platform cache directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: default_memory_budget(),
            disk_budget_bytes: default_disk_budget(),
            directory: None,
        }
    }
}

/// Image download configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum concurrent downloads.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent_downloads(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_CATALOG_BASE.to_string()
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_start_page() -> u32 {
    1
}

const fn default_timeout_secs() -> u64 {
    15
}

const fn default_memory_budget() -> u64 {
    DEFAULT_MEMORY_BUDGET
}

const fn default_disk_budget() -> u64 {
    DEFAULT_DISK_BUDGET
}

const fn default_max_concurrent_downloads() -> usize {
    4
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(base_url) = args.base_url {
            self.catalog.base_url = base_url;
        }
        if let Some(page_size) = args.page_size {
            self.catalog.page_size = page_size;
        }
        if let Some(start_page) = args.start_page {
            self.catalog.start_page = start_page;
        }
        if let Some(cache_dir) = args.cache_dir {
            self.cache.directory = Some(cache_dir);
        }
        if let Some(memory_budget) = args.memory_budget {
            self.cache.memory_budget_bytes = memory_budget;
        }
        if args.no_disk_cache {
            self.cache.disk_budget_bytes = 0;
        }
        if let Some(max) = args.max_concurrent_downloads {
            self.fetch.max_concurrent_downloads = max;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("photogrid.log"))
    }

    /// Returns default image cache directory.
    #[must_use]
    pub fn default_cache_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.cache_dir().join("images"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }

    /// Returns effective cache directory, or `None` if the disk tier is off.
    #[must_use]
    pub fn effective_cache_dir(&self) -> Option<PathBuf> {
        if self.cache.disk_budget_bytes == 0 {
            return None;
        }
        self.cache.directory.clone().or_else(Self::default_cache_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"

            [catalog]
            base_url = "http://localhost:8080"
            page_size = 50

            [cache]
            directory = "/tmp/photogrid"
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.catalog.base_url, "http://localhost:8080");
        assert_eq!(config.catalog.page_size, 50);
        assert_eq!(config.catalog.start_page, 1);
        assert_eq!(config.cache.memory_budget_bytes, DEFAULT_MEMORY_BUDGET);
        assert_eq!(
            config.cache.directory,
            Some(PathBuf::from("/tmp/photogrid"))
        );
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.catalog.base_url, DEFAULT_CATALOG_BASE);
        assert_eq!(config.catalog.page_size, 20);
        assert_eq!(config.catalog.timeout(), Duration::from_secs(15));
        assert_eq!(config.fetch.max_concurrent_downloads, 4);
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "photogrid",
            "--base-url",
            "http://mirror.test",
            "--start-page",
            "3",
            "--log-level",
            "trace",
            "--no-disk-cache",
        ]);

        config.merge_with_args(args);

        assert_eq!(config.catalog.base_url, "http://mirror.test");
        assert_eq!(config.catalog.start_page, 3);
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.effective_cache_dir(), None);
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = AppConfig::default();
        config.cache.directory = Some(PathBuf::from("/var/cache/pg"));
        assert_eq!(
            config.effective_cache_dir(),
            Some(PathBuf::from("/var/cache/pg"))
        );
    }
}
