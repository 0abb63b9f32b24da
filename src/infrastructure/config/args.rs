use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments; set values override the config file.
#[derive(Debug, Parser)]
#[command(
    name = "photogrid",
    version,
    about = "Browse a paginated image catalog with a two-tier image cache",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Catalog service root URL.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Images per page.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// First page to load.
    #[arg(long)]
    pub start_page: Option<u32>,

    /// Number of pages to load.
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,

    /// Image cache directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Memory cache budget in bytes.
    #[arg(long, value_name = "BYTES")]
    pub memory_budget: Option<u64>,

    /// Keep images in memory only.
    #[arg(long)]
    pub no_disk_cache: bool,

    /// Maximum concurrent image downloads.
    #[arg(long)]
    pub max_concurrent_downloads: Option<usize>,

    /// Print every cell state change.
    #[arg(long)]
    pub show_cells: bool,

    /// Clear the image cache before loading.
    #[arg(long)]
    pub clear_cache: bool,
}
