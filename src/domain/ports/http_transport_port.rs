//! HTTP transport port definition.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Response of a single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, when present.
    pub content_type: Option<String>,
    /// Complete response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// Creates a `200 OK` response.
    #[must_use]
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure; the request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {message}")]
    Connect { message: String },

    #[error("request failed: {message}")]
    Other { message: String },
}

/// Port for issuing HTTP GET requests.
/// Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a GET request with the given query parameters and reads the whole body.
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Reply = Result<HttpResponse, TransportError>;

    /// Scripted transport that answers per URL and counts requests.
    pub struct StubTransport {
        replies: Mutex<HashMap<String, VecDeque<Reply>>>,
        requests: Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
        delay: Duration,
        url_delays: Mutex<HashMap<String, Duration>>,
    }

    impl StubTransport {
        /// Creates a stub that answers immediately.
        pub fn new() -> Self {
            Self::with_delay(Duration::ZERO)
        }

        /// Creates a stub that sleeps before answering.
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                replies: Mutex::new(HashMap::new()),
                requests: Mutex::new(HashMap::new()),
                total: AtomicUsize::new(0),
                delay,
                url_delays: Mutex::new(HashMap::new()),
            }
        }

        /// Queues a reply for the URL. The last queued reply repeats.
        pub fn reply(&self, url: &str, reply: Reply) {
            self.replies
                .lock()
                .entry(url.to_string())
                .or_default()
                .push_back(reply);
        }

        /// Makes requests to one URL sleep instead of the default delay.
        pub fn delay_url(&self, url: &str, delay: Duration) {
            self.url_delays.lock().insert(url.to_string(), delay);
        }

        /// Number of requests made to the URL.
        pub fn requests_to(&self, url: &str) -> usize {
            self.requests.lock().get(url).copied().unwrap_or(0)
        }

        /// Number of requests made overall.
        pub fn total_requests(&self) -> usize {
            self.total.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn get(&self, url: &str, _query: &[(String, String)]) -> Reply {
            self.total.fetch_add(1, Ordering::SeqCst);
            *self.requests.lock().entry(url.to_string()).or_default() += 1;

            let delay = self
                .url_delays
                .lock()
                .get(url)
                .copied()
                .unwrap_or(self.delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let not_found = Ok(HttpResponse::new(404, ""));
            let mut replies = self.replies.lock();
            match replies.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(not_found),
                Some(queue) => queue.front().cloned().unwrap_or(not_found),
                None => not_found,
            }
        }
    }
}
