//! Cache-first image byte fetching with in-flight de-duplication.
//!
//! Lookup order: Memory -> Disk -> Network

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Semaphore, oneshot};
use tracing::{debug, trace, warn};

use crate::domain::entities::ImageDescriptor;
use crate::domain::errors::FetchError;
use crate::domain::ports::{HttpTransport, TransportError};
use crate::infrastructure::cache::CacheStore;

type FetchResult = Result<Bytes, FetchError>;

/// Configuration for the image fetcher.
#[derive(Debug, Clone)]
pub struct ImageFetcherConfig {
    /// Maximum concurrent downloads.
    pub max_concurrent_downloads: usize,
}

impl Default for ImageFetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 4,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => Self::Timeout,
            TransportError::Connect { message } => Self::connect(message),
            TransportError::Other { message } => Self::transport(message),
        }
    }
}

/// Returns image bytes from the cache or the network.
///
/// Concurrent fetches of the same source share one download. Downloads run
/// on detached tasks, so a caller dropping its future does not cancel the
/// download for the others.
#[derive(Clone)]
pub struct ImageFetcher {
    handle: Arc<FetchHandle>,
}

struct FetchHandle {
    cache: Arc<CacheStore>,
    transport: Arc<dyn HttpTransport>,
    in_flight: Mutex<HashMap<String, Vec<oneshot::Sender<FetchResult>>>>,
    semaphore: Semaphore,
}

impl std::fmt::Debug for ImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFetcher")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

impl ImageFetcher {
    /// Creates a fetcher over the shared cache and transport.
    #[must_use]
    pub fn new(
        cache: Arc<CacheStore>,
        transport: Arc<dyn HttpTransport>,
        config: &ImageFetcherConfig,
    ) -> Self {
        Self {
            handle: Arc::new(FetchHandle {
                cache,
                transport,
                in_flight: Mutex::new(HashMap::new()),
                semaphore: Semaphore::new(config.max_concurrent_downloads.max(1)),
            }),
        }
    }

    /// Returns the bytes of the described image.
    ///
    /// # Errors
    /// Returns `FetchError` if the image is not cached and the download fails.
    /// Failures are not cached.
    pub async fn fetch(&self, descriptor: &ImageDescriptor) -> FetchResult {
        let key = descriptor.cache_key();

        if let Some(bytes) = self.handle.cache.get(key).await {
            trace!(id = %descriptor.id(), "Served from cache");
            return Ok(bytes);
        }

        let (tx, rx) = oneshot::channel();
        let leader = {
            let mut in_flight = self.handle.in_flight.lock();
            if let Some(waiters) = in_flight.get_mut(key) {
                waiters.push(tx);
                false
            } else {
                in_flight.insert(key.to_string(), vec![tx]);
                true
            }
        };

        if leader {
            let handle = Arc::clone(&self.handle);
            let key = key.to_string();
            tokio::spawn(async move {
                let mut guard = InFlightGuard {
                    handle: &handle,
                    key: &key,
                    settled: false,
                };
                let result = handle.download(&key).await;
                guard.settle(&result);
            });
        } else {
            debug!(id = %descriptor.id(), "Joining in-flight download");
        }

        rx.await.unwrap_or(Err(FetchError::Aborted))
    }

    /// Returns the number of downloads in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.handle.in_flight.lock().len()
    }

    /// Returns the shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.handle.cache
    }
}

impl FetchHandle {
    async fn download(&self, url: &str) -> FetchResult {
        // A download that finished just before this one registered may have
        // filled the cache already.
        if let Some(bytes) = self.cache.get(url).await {
            return Ok(bytes);
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Aborted)?;

        debug!(url = %url, "Downloading image");
        let response = self.transport.get(url, &[]).await?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "Image download failed");
            return Err(FetchError::Status {
                status: response.status,
            });
        }

        if response.body.is_empty() {
            warn!(url = %url, "Image download returned empty body");
            return Err(FetchError::EmptyBody);
        }

        if let Some(content_type) = &response.content_type
            && !content_type.starts_with("image/")
        {
            debug!(url = %url, content_type = %content_type, "Unexpected content type");
        }

        self.cache.put(url, response.body.clone()).await;
        debug!(url = %url, size = response.body.len(), "Image downloaded");
        Ok(response.body)
    }

    fn complete(&self, key: &str, result: &FetchResult) {
        let waiters = self.in_flight.lock().remove(key).unwrap_or_default();
        trace!(url = %key, waiters = waiters.len(), "Delivering download result");
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }
}

/// Releases waiters even if the download task unwinds.
struct InFlightGuard<'a> {
    handle: &'a FetchHandle,
    key: &'a str,
    settled: bool,
}

impl InFlightGuard<'_> {
    fn settle(&mut self, result: &FetchResult) {
        self.handle.complete(self.key, result);
        self.settled = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.handle.complete(self.key, &Err(FetchError::Aborted));
        }
    }
}
