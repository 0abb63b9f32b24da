//! Gallery state store: page loading and per-cell image loading.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::entities::{CellId, CellSnapshot, ImageDescriptor, LoadState, PageState};
use crate::domain::errors::{GalleryError, PageLoadError};
use crate::domain::ports::{GalleryEvent, GalleryObserver};
use crate::infrastructure::catalog::{CatalogClient, DEFAULT_PAGE_SIZE};
use crate::infrastructure::image::ImageFetcher;

/// Pagination settings of the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryConfig {
    /// Descriptors requested per page.
    pub page_size: u32,
    /// Page loaded when the grid is empty.
    pub start_page: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            start_page: 1,
        }
    }
}

/// Result of a page request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoadOutcome {
    /// The page was applied to the grid.
    Loaded {
        /// Page number.
        page: u32,
        /// Cells added.
        count: usize,
    },
    /// The catalog answered with no images; the grid was left as is.
    EndOfCatalog {
        /// Page number.
        page: u32,
    },
    /// The same page was already being loaded.
    AlreadyInFlight,
    /// A reload replaced the grid while this page was loading.
    Superseded,
}

struct Cell {
    id: CellId,
    descriptor: ImageDescriptor,
    state: LoadState,
    generation: u64,
    watch: watch::Sender<LoadState>,
}

#[derive(Default)]
struct GalleryState {
    page: PageState,
    cells: Vec<Cell>,
    index: HashMap<CellId, usize>,
    pages_in_flight: HashSet<u32>,
    epoch: u64,
    generations: u64,
}

impl GalleryState {
    fn index_of(&self, cell: &CellId) -> Result<usize, GalleryError> {
        self.index
            .get(cell)
            .copied()
            .ok_or_else(|| GalleryError::UnknownCell { cell: cell.clone() })
    }

    fn replace(&mut self, page: u32, descriptors: Vec<ImageDescriptor>) -> usize {
        // Dropping the cells drops their watch senders, which wakes waiters.
        self.cells.clear();
        self.index.clear();
        self.page.descriptors.clear();
        self.epoch += 1;
        self.append(page, descriptors)
    }

    fn append(&mut self, page: u32, descriptors: Vec<ImageDescriptor>) -> usize {
        let mut added = 0;
        for descriptor in descriptors {
            let id = CellId::new(page, descriptor.id());
            if self.index.contains_key(&id) {
                debug!(cell = %id, "Skipping duplicate id within page");
                continue;
            }
            self.index.insert(id.clone(), self.cells.len());
            self.page.descriptors.push(descriptor.clone());
            self.cells.push(Cell {
                id,
                descriptor,
                state: LoadState::NotRequested,
                generation: 0,
                watch: watch::channel(LoadState::NotRequested).0,
            });
            added += 1;
        }
        self.page.page_number = page;
        self.page.end_of_catalog = false;
        added
    }
}

struct Inner {
    catalog: CatalogClient,
    fetcher: ImageFetcher,
    config: GalleryConfig,
    state: Mutex<GalleryState>,
    observers: RwLock<Vec<Arc<dyn GalleryObserver>>>,
}

impl Inner {
    fn publish(&self, event: &GalleryEvent) {
        for observer in self.observers.read().iter() {
            observer.on_event(event);
        }
    }

    fn publish_page(&self, state: &GalleryState) {
        self.publish(&GalleryEvent::PageChanged(state.page.clone()));
    }

    /// Moves a cell to `next` and notifies, while the state lock is held.
    fn transition(&self, state: &mut GalleryState, index: usize, next: LoadState) {
        let cell = &mut state.cells[index];
        debug!(cell = %cell.id, from = %cell.state, to = %next, "Cell transition");
        cell.state = next.clone();
        cell.watch.send_replace(next.clone());
        self.publish(&GalleryEvent::CellChanged {
            cell: cell.id.clone(),
            state: next,
        });
    }
}

enum Start {
    Settled(LoadState),
    Pending(watch::Receiver<LoadState>),
}

/// Orchestrates catalog pages and image loads for the presentation layer.
///
/// Cheap to clone; clones share state. Observers see every transition, in
/// order for any one cell.
#[derive(Clone)]
pub struct GalleryController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GalleryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryController")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl GalleryController {
    /// Creates controller.
    #[must_use]
    pub fn new(catalog: CatalogClient, fetcher: ImageFetcher, config: GalleryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                fetcher,
                config,
                state: Mutex::new(GalleryState::default()),
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Registers an observer for all subsequent transitions.
    pub fn subscribe(&self, observer: Arc<dyn GalleryObserver>) {
        self.inner.observers.write().push(observer);
    }

    /// Loads a catalog page into the grid.
    ///
    /// The page replaces the grid when the grid is empty or the page number is
    /// not past the current one; otherwise it is appended.
    ///
    /// # Errors
    /// Returns `PageLoadError` if the catalog request fails. Observers receive
    /// it too, and the grid is left untouched.
    pub async fn load_page(&self, page_number: u32) -> Result<PageLoadOutcome, PageLoadError> {
        let page_number = page_number.max(1);

        let epoch = {
            let mut state = self.inner.state.lock();
            if !state.pages_in_flight.insert(page_number) {
                debug!(page = page_number, "Page already loading");
                return Ok(PageLoadOutcome::AlreadyInFlight);
            }
            state.page.is_loading_next_page = true;
            self.inner.publish_page(&state);
            state.epoch
        };

        let result = self
            .inner
            .catalog
            .fetch_page(page_number, self.inner.config.page_size)
            .await;

        let mut state = self.inner.state.lock();
        state.pages_in_flight.remove(&page_number);
        state.page.is_loading_next_page = !state.pages_in_flight.is_empty();

        let descriptors = match result {
            Ok(descriptors) => descriptors,
            Err(source) => {
                let error = PageLoadError::new(page_number, source);
                warn!(page = page_number, error = %error, "Page load failed");
                self.inner.publish_page(&state);
                self.inner
                    .publish(&GalleryEvent::PageLoadFailed(error.clone()));
                return Err(error);
            }
        };

        if descriptors.is_empty() {
            info!(page = page_number, "Catalog returned an empty page");
            state.page.end_of_catalog = true;
            self.inner.publish_page(&state);
            return Ok(PageLoadOutcome::EndOfCatalog { page: page_number });
        }

        let replace = state.cells.is_empty() || page_number <= state.page.page_number;
        if !replace && epoch != state.epoch {
            debug!(page = page_number, "Discarding page superseded by a reload");
            self.inner.publish_page(&state);
            return Ok(PageLoadOutcome::Superseded);
        }

        let count = if replace {
            state.replace(page_number, descriptors)
        } else {
            state.append(page_number, descriptors)
        };

        info!(page = page_number, count = count, replaced = replace, "Page applied");
        self.inner.publish_page(&state);
        Ok(PageLoadOutcome::Loaded {
            page: page_number,
            count,
        })
    }

    /// Loads the page after the current one, or the start page on an empty grid.
    ///
    /// # Errors
    /// Returns `PageLoadError` if the catalog request fails.
    pub async fn load_next_page(&self) -> Result<PageLoadOutcome, PageLoadError> {
        let next = {
            let state = self.inner.state.lock();
            if state.cells.is_empty() {
                self.inner.config.start_page
            } else {
                // There is no page after `u32::MAX`.
                let next = state.page.page_number.checked_add(1);
                match next {
                    Some(next) if !state.page.end_of_catalog => next,
                    _ => {
                        return Ok(PageLoadOutcome::EndOfCatalog {
                            page: next.unwrap_or(u32::MAX),
                        });
                    }
                }
            }
        };
        self.load_page(next).await
    }

    /// Loads the image of a cell and returns its terminal state.
    ///
    /// A cell that is already loading is not fetched again; the call waits for
    /// the running fetch instead. A loaded cell is returned as is.
    ///
    /// # Errors
    /// Returns `GalleryError::UnknownCell` if the cell is not in the grid and
    /// `GalleryError::Superseded` if a reload removed it while loading.
    pub async fn load_image(&self, cell: &CellId) -> Result<LoadState, GalleryError> {
        let start = self.start(cell, false)?;
        Self::settle(cell, start).await
    }

    /// Starts loading the image of a cell without waiting for it.
    ///
    /// # Errors
    /// Returns `GalleryError::UnknownCell` if the cell is not in the grid.
    pub fn request_image(&self, cell: &CellId) -> Result<(), GalleryError> {
        self.start(cell, false).map(|_| ())
    }

    /// Re-fetches a failed cell and returns its new terminal state.
    ///
    /// # Errors
    /// Returns `GalleryError::RetryRejected` unless the cell is `Failed`.
    pub async fn retry(&self, cell: &CellId) -> Result<LoadState, GalleryError> {
        let start = self.start(cell, true)?;
        Self::settle(cell, start).await
    }

    /// Returns the grid in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CellSnapshot> {
        self.inner
            .state
            .lock()
            .cells
            .iter()
            .map(|cell| CellSnapshot {
                id: cell.id.clone(),
                descriptor: cell.descriptor.clone(),
                state: cell.state.clone(),
            })
            .collect()
    }

    /// Returns the pagination state.
    #[must_use]
    pub fn page_state(&self) -> PageState {
        self.inner.state.lock().page.clone()
    }

    /// Returns the state of one cell.
    #[must_use]
    pub fn state_of(&self, cell: &CellId) -> Option<LoadState> {
        let state = self.inner.state.lock();
        let index = state.index.get(cell)?;
        Some(state.cells[*index].state.clone())
    }

    /// Returns the fetcher shared by all cells.
    #[must_use]
    pub fn fetcher(&self) -> &ImageFetcher {
        &self.inner.fetcher
    }

    fn start(&self, cell: &CellId, retry: bool) -> Result<Start, GalleryError> {
        let mut state = self.inner.state.lock();
        let index = state.index_of(cell)?;

        let current = &state.cells[index];
        if retry && !current.state.is_failed() {
            debug!(cell = %cell, state = %current.state, "Retry rejected");
            return Err(GalleryError::RetryRejected {
                cell: cell.clone(),
                state: current.state.clone(),
            });
        }
        match &current.state {
            LoadState::Loaded(_) => return Ok(Start::Settled(current.state.clone())),
            LoadState::Loading => return Ok(Start::Pending(current.watch.subscribe())),
            LoadState::NotRequested | LoadState::Failed(_) => {}
        }

        state.generations += 1;
        let generation = state.generations;
        let target = &mut state.cells[index];
        target.generation = generation;
        let descriptor = target.descriptor.clone();
        let receiver = target.watch.subscribe();
        self.inner
            .transition(&mut state, index, LoadState::Loading);
        drop(state);

        let this = self.clone();
        let cell = cell.clone();
        tokio::spawn(async move {
            this.complete(cell, generation, descriptor).await;
        });

        Ok(Start::Pending(receiver))
    }

    async fn complete(&self, cell: CellId, generation: u64, descriptor: ImageDescriptor) {
        let result = self.inner.fetcher.fetch(&descriptor).await;

        let mut state = self.inner.state.lock();
        let Ok(index) = state.index_of(&cell) else {
            debug!(cell = %cell, "Cell removed before its fetch completed");
            return;
        };
        if state.cells[index].generation != generation {
            debug!(cell = %cell, generation = generation, "Discarding stale fetch result");
            return;
        }

        let next = match result {
            Ok(bytes) => LoadState::Loaded(bytes),
            Err(error) => {
                warn!(cell = %cell, error = %error, "Image load failed");
                LoadState::Failed(error)
            }
        };
        self.inner.transition(&mut state, index, next);
    }

    async fn settle(cell: &CellId, start: Start) -> Result<LoadState, GalleryError> {
        match start {
            Start::Settled(state) => Ok(state),
            Start::Pending(mut receiver) => receiver
                .wait_for(LoadState::is_terminal)
                .await
                .map(|state| state.clone())
                .map_err(|_| GalleryError::Superseded { cell: cell.clone() }),
        }
    }
}
