use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use futures_util::future::join_all;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use photogrid::application::{GalleryConfig, GalleryController, PageLoadOutcome};
use photogrid::domain::LoadState;
use photogrid::domain::ports::PersistentCachePort;
use photogrid::infrastructure::{
    AppConfig, CacheStore, CatalogClient, CliArgs, ConfigStorage, DiskByteCache, ImageFetcher,
    ImageFetcherConfig, ReqwestTransport,
};
use photogrid::presentation::{ConsoleObserver, render_grid};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: CliArgs) -> Result<AppConfig> {
    let storage = ConfigStorage::new().wrap_err("Failed to locate config directory")?;
    let mut config = storage
        .load_config(args.config.as_deref())
        .wrap_err("Failed to load configuration")?;
    config.merge_with_args(args);
    Ok(config)
}

async fn build_cache(config: &AppConfig) -> CacheStore {
    let memory_budget = config.cache.memory_budget_bytes;
    let Some(dir) = config.effective_cache_dir() else {
        info!("Disk cache disabled");
        return CacheStore::memory_only(memory_budget);
    };

    match DiskByteCache::new(dir, config.cache.disk_budget_bytes).await {
        Ok(disk) => {
            let disk: Arc<dyn PersistentCachePort> = Arc::new(disk);
            CacheStore::new(memory_budget, disk)
        }
        Err(e) => {
            warn!(error = %e, "Disk cache unavailable, using memory only");
            CacheStore::memory_only(memory_budget)
        }
    }
}

fn build_controller(config: &AppConfig, cache: CacheStore) -> Result<GalleryController> {
    let transport = Arc::new(
        ReqwestTransport::new(config.catalog.timeout()).wrap_err("Failed to build HTTP client")?,
    );

    let catalog = CatalogClient::with_base_url(transport.clone(), config.catalog.base_url.clone());
    let fetcher = ImageFetcher::new(
        Arc::new(cache),
        transport,
        &ImageFetcherConfig {
            max_concurrent_downloads: config.fetch.max_concurrent_downloads,
        },
    );

    Ok(GalleryController::new(
        catalog,
        fetcher,
        GalleryConfig {
            page_size: config.catalog.page_size,
            start_page: config.catalog.start_page,
        },
    ))
}

async fn run(controller: &GalleryController, pages: u32) {
    for _ in 0..pages {
        match controller.load_next_page().await {
            Ok(PageLoadOutcome::EndOfCatalog { .. }) => break,
            Ok(_) => {}
            // Already reported by the observer.
            Err(_) => break,
        }
    }

    let cells = controller.snapshot();
    let loads = cells.iter().map(|cell| controller.load_image(&cell.id));
    for result in join_all(loads).await {
        if let Err(e) = result {
            warn!(error = %e, "Image load rejected");
        }
    }

    // One retry round for transient failures.
    let retries: Vec<_> = controller
        .snapshot()
        .into_iter()
        .filter(|cell| matches!(&cell.state, LoadState::Failed(e) if e.is_transient()))
        .map(|cell| cell.id)
        .collect();
    if !retries.is_empty() {
        info!(count = retries.len(), "Retrying transient failures");
        join_all(retries.iter().map(|id| controller.retry(id))).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let pages = args.pages;
    let clear_cache = args.clear_cache;
    let show_cells = args.show_cells;
    let config = load_config(args)?;

    init_logging(&config)?;
    info!(version = photogrid::VERSION, "Starting {}", photogrid::NAME);

    let cache = build_cache(&config).await;
    if clear_cache {
        cache.clear().await;
    }

    let controller = build_controller(&config, cache)?;
    controller.subscribe(Arc::new(ConsoleObserver::new().with_cells(show_cells)));

    run(&controller, pages).await;

    println!("{}", render_grid(&controller.snapshot()));
    println!("{}", controller.fetcher().cache().stats());

    Ok(())
}
